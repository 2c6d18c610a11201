//! Integrity record written after a successful extraction.
//!
//! The record is informational. A toolchain counts as present when its
//! directory exists, whether or not this file is there.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stride_targets::HostOs;

use crate::archive::ToolchainArchive;
use crate::error::Result;

/// File name of the integrity record inside the tools directory.
pub const MANIFEST_FILE: &str = ".stride-toolchain.json";

/// One archive that went into a tools directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveRecord {
    pub label: String,
    pub size: u64,
    pub sha256: String,
}

impl ArchiveRecord {
    pub fn from_archive(archive: &ToolchainArchive) -> Self {
        Self {
            label: archive.label().to_string(),
            size: archive.len() as u64,
            sha256: archive.sha256_hex(),
        }
    }
}

/// What was extracted into a tools directory, and from which archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractionManifest {
    pub target_triple: String,
    pub toolchain_version: String,
    pub host: HostOs,
    pub archives: Vec<ArchiveRecord>,
    /// Number of regular files written.
    pub files: usize,
}

impl ExtractionManifest {
    /// Write the record as pretty JSON into `tools_dir`.
    pub fn write(&self, tools_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(tools_dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    /// Read the record from `tools_dir`. `Ok(None)` if there is none.
    pub fn read(tools_dir: &Path) -> Result<Option<Self>> {
        let path = tools_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Whether this record was produced from exactly `archives`.
    pub fn matches(&self, archives: &[ToolchainArchive]) -> bool {
        self.archives.len() == archives.len()
            && self
                .archives
                .iter()
                .zip(archives)
                .all(|(record, archive)| *record == ArchiveRecord::from_archive(archive))
    }
}
