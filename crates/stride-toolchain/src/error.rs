//! Toolchain extraction errors.

use std::path::PathBuf;

use stride_targets::HostOs;

/// Errors that can occur while making a toolchain available on disk.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Caller input was empty or malformed.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    /// The tools directory could not be created.
    #[error("unable to create tool directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An archive could not be decompressed. The tools directory has been removed.
    #[error("failed to extract tool binaries from archive '{archive}': {detail}")]
    Extraction { archive: String, detail: String },

    /// Extraction was cancelled between archives. The tools directory has been removed.
    #[error("toolchain extraction into {} was cancelled", path.display())]
    Cancelled { path: PathBuf },

    /// No archive is available for this host.
    #[error("no toolchain archives available for host '{host}'")]
    NoArchives { host: HostOs },

    /// JSON error writing or reading the integrity record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
