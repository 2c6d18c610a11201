//! Toolchain bundle lifecycle for the Stride firmware tool.
//!
//! A target ships its cross compiler as one or more compressed archives per
//! host operating system. This crate unpacks them into a tools directory
//! exactly once, repairs executable permissions the archive format drops, and
//! records what was extracted.
//!
//! The tools directory's existence is the "already extracted" signal, so a
//! failed extraction always removes the directory again.

pub mod archive;
pub mod error;
pub mod extract;
pub mod layout;
pub mod manifest;
pub mod permissions;

pub use archive::ToolchainArchive;
pub use error::{Result, ToolchainError};
pub use extract::{ExtractionOutcome, ExtractionSummary, ToolchainBundle, ToolchainState};
pub use layout::ToolchainLayout;
pub use manifest::{ArchiveRecord, ExtractionManifest, MANIFEST_FILE};
pub use permissions::{repair_executable_permissions, PermissionReport};
