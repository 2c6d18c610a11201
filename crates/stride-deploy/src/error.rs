//! Deployment errors.

use std::path::PathBuf;

use crate::session::ProgrammerState;

/// Errors that can occur while validating or programming an image.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Caller input was empty or malformed.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    /// The image file could not be read.
    #[error("unable to read {}: {source}", path.display())]
    ImageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image is not an object file we can read section headers from.
    #[error("unable to read sections of {}: {detail}", path.display())]
    Measurement { path: PathBuf, detail: String },

    /// The transport program could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The transport ran but reported failure.
    #[error("transfer failed: {detail}")]
    Transfer { detail: String },

    /// The transport did not finish within its time limit and was killed.
    #[error("transfer timed out after {secs} s")]
    TimedOut { secs: u64 },

    /// An exit request stopped the transfer.
    #[error("transfer cancelled")]
    Cancelled,

    /// The operation is not valid in the session's current state.
    #[error("cannot {action} while programmer is {state}")]
    InvalidState {
        action: &'static str,
        state: ProgrammerState,
    },

    /// I/O error while supervising the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;
