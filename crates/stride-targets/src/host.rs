//! Host operating system detection and target identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// Operating system the build tool itself runs on.
///
/// Toolchain archives and generated scripts are host specific, so every
/// host-dependent operation takes a `HostOs` explicitly instead of reading
/// `cfg!` at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    /// The host this binary was compiled for.
    pub fn current() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a host.
    pub fn from_os_name(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(HostOs::Linux),
            "macos" => Ok(HostOs::MacOs),
            "windows" => Ok(HostOs::Windows),
            other => Err(TargetError::UnsupportedHost { os: other.into() }),
        }
    }

    /// Whether extracted archives lose the executable bit on this host.
    pub fn needs_permission_repair(self) -> bool {
        matches!(self, HostOs::Linux | HostOs::MacOs)
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::MacOs => "macos",
            HostOs::Windows => "windows",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical hardware target the tool can produce firmware for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetId {
    /// Raspberry Pi 4B based STRIDE-MKII (AArch64, bare metal).
    Rpi4b,
}

impl TargetId {
    /// Every known target, in listing order.
    pub fn all() -> &'static [TargetId] {
        &[TargetId::Rpi4b]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetId::Rpi4b => "rpi4b",
        }
    }

    /// One-line description for target listings.
    pub fn description(self) -> &'static str {
        match self {
            TargetId::Rpi4b => "STRIDE-MKII (Raspberry Pi 4B, Cortex-A72, AArch64 bare metal)",
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetId {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rpi4b" | "rpi4" | "stride-mkii" => Ok(TargetId::Rpi4b),
            _ => Err(TargetError::UnknownTarget { name: s.into() }),
        }
    }
}
