//! Build script emission for Stride firmware targets.
//!
//! Everything here is pure string generation: the same configuration, host
//! and flags always produce byte-identical text, and no function touches the
//! filesystem. Writing the text to disk is the caller's job.
//!
//! - [`linker`]: the linker script placing the image at the load address
//! - [`makefile`]: the application Makefile and the test-harness Makefile
//! - [`library`]: the `makefile.inc` shared by effect library builds

pub mod emitter;
pub mod error;
pub mod library;
pub mod linker;
pub mod makefile;
pub mod profile;

pub use emitter::ScriptEmitter;
pub use error::{Result, ScriptError};
pub use makefile::TestMakefileRequest;
pub use profile::{CpuProfile, ScriptKind};

#[cfg(test)]
mod testing;
