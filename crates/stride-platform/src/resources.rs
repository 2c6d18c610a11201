//! Board support and toolchain archives a platform hands out.
//!
//! Release builds compile the archives in (`embedded-resources`); development
//! builds and tests load them from a resource directory laid out as
//!
//! ```text
//! <dir>/includes_<MCU>.zip
//! <dir>/libs_<MCU>.zip
//! <dir>/linuxTools.zip | macosTools.zip | win64ToolsA.zip .. win64ToolsD.zip
//! ```

use std::borrow::Cow;
use std::path::Path;

use stride_targets::HostOs;
use stride_toolchain::ToolchainArchive;

use crate::error::{PlatformError, Result};

/// File names of the toolchain archives for `host`, in application order.
pub fn toolchain_archive_names(host: HostOs) -> &'static [&'static str] {
    match host {
        HostOs::Linux => &["linuxTools.zip"],
        HostOs::MacOs => &["macosTools.zip"],
        HostOs::Windows => &[
            "win64ToolsA.zip",
            "win64ToolsB.zip",
            "win64ToolsC.zip",
            "win64ToolsD.zip",
        ],
    }
}

pub fn core_includes_name(mcu_type_name: &str) -> String {
    format!("includes_{mcu_type_name}.zip")
}

pub fn core_libs_name(mcu_type_name: &str) -> String {
    format!("libs_{mcu_type_name}.zip")
}

/// Compressed resources owned by one platform instance.
#[derive(Clone, Default)]
pub struct PlatformResources {
    core_includes: Cow<'static, [u8]>,
    core_libs: Cow<'static, [u8]>,
    toolchain: Vec<ToolchainArchive>,
}

impl std::fmt::Debug for PlatformResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformResources")
            .field("core_includes", &self.core_includes.len())
            .field("core_libs", &self.core_libs.len())
            .field("toolchain", &self.toolchain)
            .finish()
    }
}

impl PlatformResources {
    /// No archives at all. Script emission and budget checks still work;
    /// toolchain extraction reports that nothing is available.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resources compiled into the binary.
    pub fn from_static(
        core_includes: &'static [u8],
        core_libs: &'static [u8],
        toolchain: Vec<ToolchainArchive>,
    ) -> Self {
        Self {
            core_includes: Cow::Borrowed(core_includes),
            core_libs: Cow::Borrowed(core_libs),
            toolchain,
        }
    }

    /// Load every archive `mcu_type_name` needs on `host` from `dir`.
    pub fn from_dir(dir: &Path, mcu_type_name: &str, host: HostOs) -> Result<Self> {
        let core_includes = read_resource(&dir.join(core_includes_name(mcu_type_name)))?;
        let core_libs = read_resource(&dir.join(core_libs_name(mcu_type_name)))?;
        let mut toolchain = Vec::new();
        for name in toolchain_archive_names(host) {
            let path = dir.join(name);
            let bytes = read_resource(&path)?;
            toolchain.push(ToolchainArchive::owned(archive_label(&path), bytes));
        }
        log::debug!(
            "loaded {} toolchain archive(s) for {host} from {}",
            toolchain.len(),
            dir.display()
        );
        Ok(Self {
            core_includes: Cow::Owned(core_includes),
            core_libs: Cow::Owned(core_libs),
            toolchain,
        })
    }

    pub fn with_core_includes(mut self, bytes: Vec<u8>) -> Self {
        self.core_includes = Cow::Owned(bytes);
        self
    }

    pub fn with_core_libs(mut self, bytes: Vec<u8>) -> Self {
        self.core_libs = Cow::Owned(bytes);
        self
    }

    pub fn with_toolchain(mut self, archives: Vec<ToolchainArchive>) -> Self {
        self.toolchain = archives;
        self
    }

    pub fn core_includes(&self) -> &[u8] {
        &self.core_includes
    }

    pub fn core_libs(&self) -> &[u8] {
        &self.core_libs
    }

    pub fn toolchain(&self) -> &[ToolchainArchive] {
        &self.toolchain
    }
}

fn read_resource(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(PlatformError::MissingResource {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read(path)?)
}

fn archive_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
