//! Script emission errors.

use stride_targets::HostOs;

use crate::profile::ScriptKind;

/// Errors that can occur while emitting build scripts.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The target has no rendition of this script for the host.
    #[error("{script} is not supported for target '{target}' on host '{host}'")]
    UnsupportedTarget {
        target: String,
        host: HostOs,
        script: ScriptKind,
    },

    /// A caller-supplied value cannot be written into a script.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },
}

/// Result type alias for script emission.
pub type Result<T> = std::result::Result<T, ScriptError>;
