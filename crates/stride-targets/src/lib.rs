//! Target platform definitions for the Stride firmware tool.
//!
//! A hardware target is described by three pieces:
//! - **Identity:** which board ([`TargetId`]) and which host the tool runs on ([`HostOs`])
//! - **Configuration:** toolchain identity, artifact names and resource limits ([`PlatformConfig`])
//! - **Build flags:** per-invocation switches applied to generated build scripts ([`BuildFlags`])

pub mod config;
pub mod error;
pub mod flags;
pub mod host;
pub mod parse;

pub use config::{MemoryMap, PlatformConfig};
pub use error::{Result, TargetError};
pub use flags::BuildFlags;
pub use host::{HostOs, TargetId};
pub use parse::{
    config_to_toml, load_overrides_toml, parse_overrides_toml, require_valid, validate_config,
    ConfigOverrides, ValidationIssue, MAX_TRANSFER_TIMEOUT_SECS,
};
