//! Error types for target configuration.

use std::path::PathBuf;

/// Errors that can occur while selecting or configuring a target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading override files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Override file not found.
    #[error("platform override file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Unknown target identifier.
    #[error("unknown target '{name}'")]
    UnknownTarget {
        /// The name that failed to resolve.
        name: String,
    },

    /// The tool was built for a host operating system no target supports.
    #[error("unsupported host operating system '{os}'")]
    UnsupportedHost {
        /// Value of `std::env::consts::OS`.
        os: String,
    },

    /// Configuration violates an invariant.
    #[error("invalid platform configuration: {detail}")]
    Validation {
        /// Description of the failures, joined.
        detail: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
