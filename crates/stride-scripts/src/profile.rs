//! CPU tuning profiles and the catalogue of emitted scripts.

use std::fmt;

use stride_targets::HostOs;

/// Architecture flags shared by every script a target emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuProfile {
    /// Value of the `ARCH` make variable.
    pub arch: &'static str,
    /// Default of the `ARCHCPU` make variable.
    pub archcpu: &'static str,
    /// Address the `.init` section is placed at.
    pub load_address: u32,
}

impl CpuProfile {
    /// Raspberry Pi 4B: Cortex-A72, 64-bit, little endian, kernel at 0x80000.
    pub const CORTEX_A72: CpuProfile = CpuProfile {
        arch: "aarch64",
        archcpu: "-DAARCH=64 -mcpu=cortex-a72 -mlittle-endian",
        load_address: 0x8_0000,
    };

    /// `LOADADDR` as written in makefiles.
    pub fn load_address_hex(&self) -> String {
        format!("{:#x}", self.load_address)
    }
}

/// The scripts a target can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    LinkerScript,
    Makefile,
    TestMakefile,
    LibraryMakefileInc,
}

impl ScriptKind {
    pub fn all() -> &'static [ScriptKind] {
        &[
            ScriptKind::LinkerScript,
            ScriptKind::Makefile,
            ScriptKind::TestMakefile,
            ScriptKind::LibraryMakefileInc,
        ]
    }

    /// Hosts for which a rendition exists.
    pub fn supported_on(self, host: HostOs) -> bool {
        match self {
            ScriptKind::LinkerScript => true,
            ScriptKind::Makefile => host == HostOs::Linux,
            ScriptKind::TestMakefile | ScriptKind::LibraryMakefileInc => {
                matches!(host, HostOs::Linux | HostOs::MacOs)
            }
        }
    }

    /// Conventional file name for the script on disk.
    pub fn default_file_name(self) -> &'static str {
        match self {
            ScriptKind::LinkerScript => "linker.ld",
            ScriptKind::Makefile | ScriptKind::TestMakefile => "Makefile",
            ScriptKind::LibraryMakefileInc => "makefile.inc",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScriptKind::LinkerScript => "linker script",
            ScriptKind::Makefile => "makefile",
            ScriptKind::TestMakefile => "test makefile",
            ScriptKind::LibraryMakefileInc => "library makefile include",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_address_formatting() {
        assert_eq!(CpuProfile::CORTEX_A72.load_address_hex(), "0x80000");
    }

    #[test]
    fn host_support_matrix() {
        assert!(ScriptKind::LinkerScript.supported_on(HostOs::Windows));
        assert!(ScriptKind::Makefile.supported_on(HostOs::Linux));
        assert!(!ScriptKind::Makefile.supported_on(HostOs::MacOs));
        assert!(ScriptKind::TestMakefile.supported_on(HostOs::MacOs));
        assert!(!ScriptKind::LibraryMakefileInc.supported_on(HostOs::Windows));
    }
}
