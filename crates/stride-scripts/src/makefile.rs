//! Application and test-harness Makefiles.
//!
//! Both files are included by, or sit next to, a project tree whose own
//! Makefile defines `TARGET`, `OBJ_FILES` and friends; only the toolchain and
//! platform specific parts are generated here.

use stride_targets::PlatformConfig;

use crate::error::{Result, ScriptError};
use crate::profile::CpuProfile;

/// Board and runtime defines shared by every compile rule.
pub(crate) const CIRCLE_DEFINES: &str =
    "-DREALTIME -DDEFAULT_KEYMAP=\"US\" -D__circle__=450100 -DRASPPI=4 -DSTDLIB_SUPPORT=1 -D__VCCOREVER__=0x04000000";

/// Compatibility defines for libraries written against the Teensy core.
pub(crate) const COMPAT_DEFINES: &str = "-DRASPPI4 -DARDUINO=10815 -DTEENSYDUINO -D__arm__";

pub(crate) const CXX_STANDARD_FLAGS: &str =
    "-std=gnu++17 -fpermissive -fno-rtti -fno-threadsafe-statics -felide-constructors";

/// `-DAUDIO_BLOCK_SAMPLES=<n> -DAUDIO_SAMPLE_RATE_EXACT=<rate>.0f`
pub(crate) fn audio_defines(config: &PlatformConfig) -> String {
    format!(
        "-DAUDIO_BLOCK_SAMPLES={} -DAUDIO_SAMPLE_RATE_EXACT={}.0f",
        config.audio_block_samples, config.audio_sample_rate
    )
}

/// Prefix, search path and architecture preamble.
pub(crate) fn push_toolchain_preamble(out: &mut String, compiler_path: &str, config: &PlatformConfig, profile: &CpuProfile) {
    out.push_str(&format!("COMPILER_PATH = {compiler_path}\n"));
    out.push_str(&format!("TOOL_PREFIX={}\n", config.tool_prefix()));
    out.push_str("BASE_DIR = $(CURDIR)\n");
    out.push_str("PATH +=:$(COMPILER_PATH)\n");
    out.push_str(&format!("ARCH={}\n", profile.arch));
}

/// Freestanding compile flags used by test and library builds.
pub(crate) fn push_cppflags(out: &mut String, config: &PlatformConfig) {
    out.push_str("CPPFLAGS += -c -Wall -fsigned-char -ffreestanding $(COMMON_FLAGS)\n");
    out.push_str("CPPFLAGS += -ffunction-sections -fdata-sections -fno-exceptions -fno-rtti\n");
    out.push_str("CPPFLAGS += -Wno-error=narrowing\n");
    out.push_str("CPPFLAGS += $(ARCHCPU)\n");
    out.push_str(&format!("CPPFLAGS += {CIRCLE_DEFINES}\n"));
    out.push_str("CPPFLAGS += -U__unix__ -U__linux__\n");
    out.push_str("CPPFLAGS += -DSYSPLATFORM_STD_MUTEX\n");
    out.push_str("CPPFLAGS += -DPROCESS_SERIAL_MIDI\n");
    out.push_str(&format!("CPPFLAGS += {}\n", audio_defines(config)));
    out.push_str("CPPFLAGS += -D__GNUC_PYTHON__\n");
}

/// Runtime libraries resolved through the cross compiler, in link order.
fn push_runtime_libs(out: &mut String, gcc: &str) {
    for (var, pad, lib) in [
        ("LIBGCC", "    ", "libgcc.a"),
        ("LIBC", "      ", "libc.a"),
        ("LIBM", "\t  ", "libm.a"),
        ("LIBNOSYS", "  ", "libnosys.a"),
        ("LIBSTDCPP", " ", "libstdc++.a"),
    ] {
        out.push_str(&format!(
            "{var}{pad}= \"$(shell {gcc} $(ARCHCPU) -print-file-name={lib})\"\n"
        ));
    }
    out.push_str("CIRCLE_LIBS += $(LIBSTDCPP) $(LIBM) $(LIBC) $(LIBGCC) $(LIBNOSYS)\n");
}

fn ldflags_line(profile: &CpuProfile) -> String {
    format!(
        "LOADADDR = {}\nLDFLAGS += -O2 --gc-sections --relax --section-start=.init=$(LOADADDR)\n",
        profile.load_address_hex()
    )
}

/// Makefile fragment that links an application into `$(TARGET).img` and
/// copies it to the name the deployment transport expects.
pub fn application_makefile(config: &PlatformConfig, profile: &CpuProfile) -> String {
    let mut out = String::new();
    out.push_str("CPPFILT\t= $(TOOL_PREFIX)c++filt\n");
    out.push_str(&format!("ARCHCPU\t?= {}\n", profile.archcpu));
    out.push_str("CPPFLAGS += -ffreestanding -fno-rtti\n");
    out.push_str("CPPFLAGS += $(ARCHCPU)\n");
    out.push_str(
        "CPPFLAGS += -DREALTIME -DDEFAULT_KEYMAP=\"US\" -D__circle__=450100 -DRASPPI=4 -DRASPPI4 -DSTDLIB_SUPPORT=1 -D__VCCOREVER__=0x04000000\n",
    );
    out.push_str("CPPFLAGS += -U__unix__ -U__linux__\n");
    out.push_str("CPPFLAGS += -DSYSPLATFORM_STD_MUTEX\n");
    out.push_str("CPPFLAGS += -D__GNUC_PYTHON__\n");
    out.push('\n');
    push_runtime_libs(&mut out, "$(TOOL_PREFIX)gcc");
    out.push('\n');
    out.push_str("INCLUDE_DIRS_LIST +=\n");
    out.push_str("INCLUDE_DIRS += $(addprefix -I./include/, $(INCLUDE_DIRS_LIST))\n");
    out.push_str("CPPFLAGS += $(INCLUDE_DIRS)\n");
    out.push_str("CFLAGS +=\n");
    out.push_str("CXXFLAGS += -Wno-aligned-new\n");
    out.push('\n');
    out.push_str(&ldflags_line(profile));
    out.push('\n');
    out.push_str("SYS_STAT_LIBS += --whole-archive $(addprefix -l:, $(DATAPAK_LIST)) --no-whole-archive\n");
    out.push('\n');
    out.push_str("all: $(TARGET)\n");
    out.push_str("%.o: %.cpp\n");
    out.push_str("\t$(CXX) $(CPPFLAGS) $(CXXFLAGS) $(RELEASEFLAGS) -c -o $@ $<\n");
    out.push_str("$(TARGET): $(OBJ_FILES)\n");
    out.push_str("\t$(LD) -o $(TARGET).elf -Map $(TARGET).map $(LDFLAGS) $(LD_FILE) \\\n");
    out.push_str("\t\t$(CRTBEGIN) $(OBJ_FILES) $(SYS_STAT_LIBS) $(CORE_LIBS) \\\n");
    out.push_str("\t--start-group $(CIRCLE_LIBS) --end-group $(CRTEND)\n");
    out.push_str("\t$(OBJDUMP) -d $(TARGET).elf | $(CPPFILT) > $(TARGET).lst\n");
    out.push_str("\t$(OBJCOPY) $(TARGET).elf -O binary $(TARGET).img\n");
    out.push_str(&format!("\t$-cp $(TARGET).img {}\n", config.legacy_image_name));
    out.push_str("clean:\n");
    out.push_str("\t-rm -f $(OBJ_FILES)\n");
    out.push_str("\t-rm -f $(TARGET)\n");
    out.push('\n');
    out
}

/// Inputs of the test-harness Makefile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMakefileRequest {
    /// Extracted toolchain root; `bin/` under it goes on the search path.
    pub tools_dir: String,
    /// Directory holding the prebuilt core library.
    pub libs_dir: String,
    /// Effect library archive linked into the test application.
    pub dat_filename: String,
    /// Base name of the test application and of its main object.
    pub test_app_name: String,
    /// Base name of the object holding impulse-response data.
    pub ir_data_name: String,
    /// Include directories, in search order.
    pub include_dirs: Vec<String>,
}

fn require_word(name: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ScriptError::InvalidArgument {
            detail: format!("{name} '{value}' must be a non-empty word"),
        });
    }
    Ok(())
}

impl TestMakefileRequest {
    fn validate(&self) -> Result<()> {
        if self.tools_dir.is_empty() {
            return Err(ScriptError::InvalidArgument {
                detail: "tools directory is empty".into(),
            });
        }
        require_word("test application name", &self.test_app_name)?;
        require_word("IR data name", &self.ir_data_name)?;
        require_word("data file name", &self.dat_filename)
    }
}

/// Makefile that links a test application against the core library.
pub fn test_makefile(config: &PlatformConfig, profile: &CpuProfile, request: &TestMakefileRequest) -> Result<String> {
    request.validate()?;
    let app = &request.test_app_name;
    let ir = &request.ir_data_name;
    let rev = config.board_revision;

    let mut out = String::new();
    out.push_str(&format!("export AVALON_REV={rev}\n"));
    push_toolchain_preamble(&mut out, &format!("{}/bin/", request.tools_dir), config, profile);

    let includes: Vec<String> = request.include_dirs.iter().map(|d| format!("-I{d}")).collect();
    out.push_str(&format!("INCLUDE_DIRS = {}\n", includes.join(" ")));
    out.push_str(&format!("LIBS_DIR = {}\n", request.libs_dir));
    out.push_str(&format!("EFX_FILE = {}\n", request.dat_filename));
    out.push_str(&format!("CORE_FILENAME = {}\n", config.core_library_filename()));

    out.push_str("CC      = $(TOOL_PREFIX)gcc\n");
    out.push_str("CXX     = $(TOOL_PREFIX)g++\n");
    out.push_str("LD      = $(TOOL_PREFIX)ld\n");
    out.push_str("OBJCOPY = $(TOOL_PREFIX)objcopy\n");
    out.push_str("OBJDUMP = $(TOOL_PREFIX)objdump\n");
    out.push_str("CPPFILT\t= $(TOOL_PREFIX)c++filt\n");
    out.push_str(&format!("ARCHCPU\t?= {}\n", profile.archcpu));
    push_cppflags(&mut out, config);
    push_runtime_libs(&mut out, "$(COMPILER_PATH)/$(TOOL_PREFIX)gcc");
    out.push_str("DEFAULTFLAGS = -O2 -D NDEBUG -DUSB_MIDI_AUDIO_SERIAL\n");
    out.push('\n');
    out.push_str(&format!("CPPFLAGS += {COMPAT_DEFINES}\n"));
    out.push_str(&format!("ifeq ($(AVALON_REV),{rev})\n"));
    out.push_str(&format!("CPPFLAGS += -DAVALON_REV{rev}\n"));
    out.push_str("endif\n");
    out.push_str("CPPFLAGS += $(INCLUDE_DIRS)\n");
    out.push_str(&format!("CXXFLAGS += {CXX_STANDARD_FLAGS}\n"));
    out.push_str(&ldflags_line(profile));
    out.push_str(&format!("LD_FILE  = -T./{}\n", config.linker_filename));
    out.push_str("LDFLAGS  += -L./lib -L../efx\n");
    out.push_str("LDFLAGS  += -L./ -L$(LIBS_DIR)\n");
    out.push_str("CORE_LIBS = -l:$(CORE_FILENAME)\n");
    out.push_str(&format!("TARGET_HEXNAME={app}.hex\n"));
    out.push_str(&format!("all: {app}\n\n"));
    out.push_str("%.o:%.cpp\n");
    out.push_str("\t$(CXX) $(CPPFLAGS) $(CXXFLAGS) $(DEFAULTFLAGS) $(INCLUDE_DIRS) -c -o $@ $<\n\n");
    out.push_str(&format!("{app}: {app}.o {ir}.o\n"));
    out.push_str(&format!(
        "\t$(LD) $(COMMON_FLAGS) -o {app} $(LDFLAGS) $(LD_FILE) {app}.o {ir}.o -l:$(EFX_FILE) $(CORE_LIBS) --start-group $(CIRCLE_LIBS) --end-group\n"
    ));
    out.push_str("clean:\n");
    out.push_str(&format!("\t-rm -rf {app} {app}.o {ir}.o\n"));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rpi4_config as config;

    fn request() -> TestMakefileRequest {
        TestMakefileRequest {
            tools_dir: "/opt/stride/tools".into(),
            libs_dir: "/opt/stride/libs".into(),
            dat_filename: "Reverb.STRIDE-MKII.dat".into(),
            test_app_name: "reverb_test".into(),
            ir_data_name: "ir_data".into(),
            include_dirs: vec!["/opt/stride/inc".into(), "./src".into()],
        }
    }

    #[test]
    fn application_makefile_pipeline() {
        let text = application_makefile(&config(), &CpuProfile::CORTEX_A72);
        assert!(text.contains("ARCHCPU\t?= -DAARCH=64 -mcpu=cortex-a72 -mlittle-endian\n"));
        assert!(text.contains("LOADADDR = 0x80000\n"));
        assert!(text.contains("\t$(OBJCOPY) $(TARGET).elf -O binary $(TARGET).img\n"));
        assert!(text.contains("\t$-cp $(TARGET).img kernel84.img\n"));
        assert!(text.contains("-ffreestanding -fno-rtti"));
        let objdump = text.find("$(OBJDUMP)").unwrap();
        let objcopy = text.find("$(OBJCOPY)").unwrap();
        assert!(objdump < objcopy);
    }

    #[test]
    fn legacy_name_follows_config() {
        let mut config = config();
        config.legacy_image_name = "kernel8.img".into();
        let text = application_makefile(&config, &CpuProfile::CORTEX_A72);
        assert!(text.contains("$(TARGET).img kernel8.img\n"));
    }

    #[test]
    fn test_makefile_header_and_names() {
        let text = test_makefile(&config(), &CpuProfile::CORTEX_A72, &request()).unwrap();
        assert!(text.starts_with("export AVALON_REV=2\nCOMPILER_PATH = /opt/stride/tools/bin/\n"));
        assert!(text.contains("TOOL_PREFIX=aarch64-none-elf-\n"));
        assert!(text.contains("INCLUDE_DIRS = -I/opt/stride/inc -I./src\n"));
        assert!(text.contains("CORE_FILENAME = core.1.4.2.dat\n"));
        assert!(text.contains("EFX_FILE = Reverb.STRIDE-MKII.dat\n"));
        assert!(text.contains("LD_FILE  = -T./linker.ld\n"));
        assert!(text.contains("TARGET_HEXNAME=reverb_test.hex\n"));
        assert!(text.contains("reverb_test: reverb_test.o ir_data.o\n"));
        assert!(text.contains("ifeq ($(AVALON_REV),2)\nCPPFLAGS += -DAVALON_REV2\nendif\n"));
    }

    #[test]
    fn test_makefile_flag_tokens() {
        let text = test_makefile(&config(), &CpuProfile::CORTEX_A72, &request()).unwrap();
        assert!(text.contains("-DAUDIO_BLOCK_SAMPLES=128 -DAUDIO_SAMPLE_RATE_EXACT=48000.0f"));
        assert!(text.contains("-ffunction-sections -fdata-sections -fno-exceptions -fno-rtti"));
        assert!(text.contains("DEFAULTFLAGS = -O2 -D NDEBUG -DUSB_MIDI_AUDIO_SERIAL\n"));
        assert!(text.contains(
            "LIBGCC    = \"$(shell $(COMPILER_PATH)/$(TOOL_PREFIX)gcc $(ARCHCPU) -print-file-name=libgcc.a)\"\n"
        ));
    }

    #[test]
    fn test_makefile_rejects_bad_names() {
        let mut bad = request();
        bad.test_app_name = "two words".into();
        assert!(matches!(
            test_makefile(&config(), &CpuProfile::CORTEX_A72, &bad),
            Err(ScriptError::InvalidArgument { .. })
        ));

        let mut bad = request();
        bad.tools_dir.clear();
        assert!(test_makefile(&config(), &CpuProfile::CORTEX_A72, &bad).is_err());
    }

    #[test]
    fn empty_include_list() {
        let mut req = request();
        req.include_dirs.clear();
        let text = test_makefile(&config(), &CpuProfile::CORTEX_A72, &req).unwrap();
        assert!(text.contains("INCLUDE_DIRS = \n"));
    }
}
