//! Platform-level errors.
//!
//! Each lower crate keeps its own error enum; [`PlatformError`] wraps them so
//! callers of [`Platform`](crate::Platform) deal with one type, and
//! [`ErrorKind`] sorts every failure into the small taxonomy front ends act on.

use std::fmt;
use std::path::PathBuf;

use stride_deploy::DeployError;
use stride_scripts::ScriptError;
use stride_targets::TargetError;
use stride_toolchain::ToolchainError;

/// Coarse classification of a [`PlatformError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input was empty, malformed or used in the wrong state.
    InvalidArgument,
    /// A file or directory could not be read or written.
    Io,
    /// A toolchain archive could not be applied.
    Extraction,
    /// The target has no support for the requested operation on this host.
    UnsupportedTarget,
    /// Moving the image onto the device failed.
    Transfer,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Io => "I/O",
            ErrorKind::Extraction => "extraction",
            ErrorKind::UnsupportedTarget => "unsupported target",
            ErrorKind::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// Errors returned by [`Platform`](crate::Platform) operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// A resource archive expected in the resource directory is absent.
    #[error("missing platform resource {}", path.display())]
    MissingResource { path: PathBuf },

    /// I/O error loading resources.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::Target(e) => match e {
                TargetError::UnknownTarget { .. } | TargetError::UnsupportedHost { .. } => {
                    ErrorKind::UnsupportedTarget
                }
                TargetError::Toml(_) | TargetError::TomlSer(_) | TargetError::Validation { .. } => {
                    ErrorKind::InvalidArgument
                }
                TargetError::Io(_) | TargetError::NotFound { .. } => ErrorKind::Io,
            },
            PlatformError::Toolchain(e) => match e {
                ToolchainError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
                ToolchainError::Extraction { .. } | ToolchainError::Cancelled { .. } => {
                    ErrorKind::Extraction
                }
                ToolchainError::NoArchives { .. } => ErrorKind::UnsupportedTarget,
                ToolchainError::CreateDir { .. } | ToolchainError::Json(_) | ToolchainError::Io(_) => {
                    ErrorKind::Io
                }
            },
            PlatformError::Script(e) => match e {
                ScriptError::UnsupportedTarget { .. } => ErrorKind::UnsupportedTarget,
                ScriptError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            },
            PlatformError::Deploy(e) => match e {
                DeployError::InvalidArgument { .. } | DeployError::InvalidState { .. } => {
                    ErrorKind::InvalidArgument
                }
                DeployError::ImageIo { .. } | DeployError::Measurement { .. } | DeployError::Io(_) => {
                    ErrorKind::Io
                }
                DeployError::Launch { .. }
                | DeployError::Transfer { .. }
                | DeployError::TimedOut { .. }
                | DeployError::Cancelled => ErrorKind::Transfer,
            },
            PlatformError::MissingResource { .. } | PlatformError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
