//! `makefile.inc` for effect library builds.
//!
//! An effect project's Makefile sets `TARGET_NAME`, the source lists and
//! `API_HEADER_LIST`, then includes this file to get the toolchain setup and
//! the rules that archive everything into `<target>.<product>.dat`.

use stride_targets::{BuildFlags, PlatformConfig};

use crate::makefile::{push_cppflags, push_toolchain_preamble, COMPAT_DEFINES, CXX_STANDARD_FLAGS};
use crate::profile::CpuProfile;

/// Libraries from the core bundle whose headers every effect may include.
const CORE_LIBRARY_DIRS: &[&str] = &["arm_math", "globalCompat", "sysPlatformRpi4", "Avalon", "Stride", "Audio"];

/// Library list as consumed by the packaging step. Existing packages match
/// on this exact string, spelling included.
const CORE_LIBRARY_COMMA_LIST: &str = "arm_math,globalCompat,sysPlatfromRpi4,Avalon,Stride,Audio";

/// Build the include text.
///
/// `quiet_recipes` prefixes recipe lines with `@` via `TMOD`.
pub fn library_makefile_inc(
    config: &PlatformConfig,
    profile: &CpuProfile,
    flags: &BuildFlags,
    cpp_flags: &str,
    quiet_recipes: bool,
) -> String {
    let rev = config.board_revision;
    let mut out = String::new();

    if quiet_recipes {
        out.push_str("TMOD=@\n");
    }
    push_toolchain_preamble(&mut out, "$(CURDIR)/tools/bin/", config, profile);
    out.push_str(&format!("PLATFORM_NAME={}\n", config.product_name));
    out.push_str("INCLUDE_PATH = $(CURDIR)/extinc\n");
    out.push_str("SRCDIR = $(BASE_DIR)/src\n");
    out.push_str("OBJDIR = $(BASE_DIR)/obj\n");
    out.push_str("INCDIR = $(BASE_DIR)/inc\n");
    out.push_str("EFXDIR=$(BASE_DIR)/../../efx\n");
    out.push_str("OUTPUT_DIRS=$(EFXDIR) $(OBJDIR)\n");
    out.push_str("MKDIR_P = mkdir -p\n");
    out.push('\n');

    out.push_str("CC      = $(TOOL_PREFIX)gcc\n");
    out.push_str("CXX     = $(TOOL_PREFIX)g++\n");
    out.push_str("AS      = $(TOOL_PREFIX)as\n");
    out.push_str("AR      = $(TOOL_PREFIX)gcc-ar\n");
    out.push_str("LD      = $(TOOL_PREFIX)ld\n");
    out.push_str("OBJCOPY = $(TOOL_PREFIX)objcopy\n");
    out.push_str("OBJDUMP = $(TOOL_PREFIX)objdump\n");
    out.push_str("CPPFILT\t= $(TOOL_PREFIX)c++filt\n");
    out.push_str(&format!("ARCHCPU\t?= {}\n", profile.archcpu));

    out.push_str("\n# Compiler and Linker settings\n");
    out.push_str("COMMON_FLAGS +=");
    if flags.no_printf {
        out.push_str(" -DNO_EFX_PRINTF");
    }
    out.push('\n');

    out.push_str("\n# Preprocessor flags\n");
    push_cppflags(&mut out, config);
    out.push_str(&format!("CPPFLAGS += {cpp_flags}\n"));
    out.push_str(&format!("CPPFLAGS += {COMPAT_DEFINES}\n"));
    out.push_str("INCLUDE_PATHS = -I$(INCLUDE_PATH) -I$(INCLUDE_PATH)/cores -I$(BASE_DIR)/inc/$(TARGET_NAME) -I$(BASE_DIR)/src -I$(BASE_DIR)/src/inc\n");
    out.push_str("CPPFLAGS += $(INCLUDE_PATHS)\n");
    out.push('\n');
    out.push_str(&format!("ifeq ($(AVALON_REV),{rev})\n"));
    out.push_str(&format!("CPPFLAGS += -DAVALON_REV{rev}\n"));
    out.push_str("endif\n");
    out.push('\n');
    out.push_str(&format!("RPI4LIBS_INCLUDE_LIST = {}\n", CORE_LIBRARY_DIRS.join(" ")));
    out.push_str(&format!("RPI4LIBS_COMMA_LIST = \"{CORE_LIBRARY_COMMA_LIST}\"\n"));
    out.push('\n');
    out.push_str("RPI4LIBS_INCLUDE_PATHS = $(addprefix -I$(INCLUDE_PATH)/, $(RPI4LIBS_INCLUDE_LIST))\n");
    out.push_str("INCLUDE_PATHS += $(RPI4LIBS_INCLUDE_PATHS)\n");
    out.push_str("CPPFLAGS += $(RPI4LIBS_INCLUDE_PATHS)\n");
    out.push('\n');
    out.push_str("CFLAGS   += -std=gnu99 $(COMMON_FLAGS)\n");
    out.push_str(&format!("CXXFLAGS += {CXX_STANDARD_FLAGS}\n"));
    out.push('\n');
    out.push_str("# Archiver flags\n");
    out.push_str("ARFLAGS   = -cr\n");
    out.push('\n');
    out.push_str("DEBUGFLAGS     = -g -O0 -D_DEBUG -DUSB_DUAL_SERIAL\n");

    // Exactly one optimisation level ends up in RELEASEFLAGS.
    out.push_str("RELEASEFLAGS   = -s -fvisibility=hidden -D NDEBUG -DUSB_MIDI_AUDIO_SERIAL");
    if flags.enable_fast_math {
        out.push_str(" -ffast-math");
    }
    out.push(' ');
    out.push_str(flags.optimization_token());
    out.push('\n');

    if flags.is_debug {
        out.push_str("DEFAULTFLAGS   = $(DEBUGFLAGS)\n");
    } else {
        out.push_str("DEFAULTFLAGS   = $(RELEASEFLAGS)\n");
    }

    out.push_str(concat!(
        "\n",
        "STATIC_TARGET_LIST = $(TARGET_NAME).$(PLATFORM_NAME).dat\n",
        "\n",
        "API_HEADERS = $(addprefix $(INCDIR)/, $(API_HEADER_LIST))\n",
        "\n",
        "SOURCES_CPP = $(addprefix $(SRCDIR)/, $(CPP_SRC_LIST))\n",
        "SOURCES_C = $(addprefix $(SRCDIR)/, $(C_SRC_LIST))\n",
        "SOURCES_S = $(addprefix $(SRCDIR)/, $(S_SRC_LIST))\n",
        "\n",
        "OBJECTS_CPP = $(addsuffix .o, $(addprefix $(OBJDIR)/, $(CPP_SRC_LIST)))\n",
        "OBJECTS_C = $(addsuffix .o, $(addprefix $(OBJDIR)/, $(C_SRC_LIST)))\n",
        "OBJECTS_S = $(addsuffix .o, $(addprefix $(OBJDIR)/, $(S_SRC_LIST)))\n",
        "\n",
        "PREPROC_DEFINES = $(addprefix -D, $(PREPROC_DEFINES_LIST))\n",
        "CPPFLAGS += $(PREPROC_DEFINES)\n",
        "\n",
        "STATIC_TARGET = $(EFXDIR)/$(STATIC_TARGET_LIST)\n",
        "\n",
        "all: directories api_headers $(STATIC_TARGET)\n",
        "\n",
        "directories:\n",
        "\t$(TMOD)$(MKDIR_P) $(OUTPUT_DIRS)\n",
        "\n",
        "api_headers:\n",
        "\t$(TMOD)-cp -f $(API_HEADERS) $(EFXDIR)\n",
        "\n",
        "$(STATIC_TARGET): $(OBJECTS_C) $(OBJECTS_CPP) $(OBJECTS_S)\n",
        "\t$(AR) $(ARFLAGS) $(STATIC_TARGET) $(OBJECTS_C) $(OBJECTS_CPP) $(OBJECTS_S)\n",
        "\n",
        "$(OBJDIR)%.cpp.o: $(SRCDIR)%.cpp\n",
        "\t$(TMOD)$(CXX) $(CPPFLAGS) $(CXXFLAGS) $(DEFAULTFLAGS) -c -o $@ $<\n",
        "\n",
        "$(OBJDIR)%.c.o: $(SRCDIR)%.c\n",
        "\t$(TMOD)$(CC) $(CPPFLAGS) $(CFLAGS) $(DEFAULTFLAGS) -c -o $@ $<\n",
        "\n",
        "$(OBJDIR)%.S.o: $(SRCDIR)%.S\n",
        "\t$(TMOD)$(CC) $(CPPFLAGS) -x assembler-with-cpp $(DEFAULTFLAGS) -c -o $@ $<\n",
        "\n",
        "clean:\n",
        "\t$(TMOD)-rm -f $(OBJECTS_C) $(OBJECTS_CPP) $(OBJECTS_S)\n",
        "\t$(TMOD)-rm -f $(DYN_TARGET) $(STATIC_TARGET)\n",
        "\t$(TMOD)-rm -f $(EFXDIR)/*.h $(EFXDIR)/*.efx\n",
        "\t$(TMOD)-rm -f $(ZIPDIR)/$(TARGET_NAME).zip\n",
        "printvar:\n",
        "\t$(foreach v, $(.VARIABLES), $(info $(v) = $($(v))))\n",
        ".PHONY: directories api_headers clean printvar\n",
        "\n",
    ));
    out
}
