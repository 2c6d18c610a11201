//! Compressed toolchain archives.

use std::borrow::Cow;
use std::fmt;

use sha2::{Digest, Sha256};

/// One compressed archive of a toolchain distribution.
///
/// Archives are usually compiled into the binary (`&'static [u8]`), but can
/// also be loaded at startup from a resource directory; both share this type.
/// Large distributions are split over several archives that must all be
/// applied to the same directory.
#[derive(Clone)]
pub struct ToolchainArchive {
    label: String,
    bytes: Cow<'static, [u8]>,
}

impl ToolchainArchive {
    /// Wrap a compiled-in archive.
    pub fn embedded(label: impl Into<String>, bytes: &'static [u8]) -> Self {
        Self {
            label: label.into(),
            bytes: Cow::Borrowed(bytes),
        }
    }

    /// Wrap an archive loaded at runtime.
    pub fn owned(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes: Cow::Owned(bytes),
        }
    }

    /// Human-readable name used in log messages and the integrity record.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the archive bytes.
    pub fn sha256_hex(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for ToolchainArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolchainArchive")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}
