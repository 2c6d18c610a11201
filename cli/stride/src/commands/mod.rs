//! CLI command implementations.

pub mod check;
pub mod doctor;
pub mod program;
pub mod scripts;
pub mod target;
pub mod tools;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stride_platform::{
    builtin_config, load_overrides_for, select_platform, ConfigOverrides, HostOs, Platform,
    PlatformResources, TargetId,
};

use crate::manifest::{merge_overrides, resolve_target, StrideManifest};

/// Where the command runs and what the user asked for globally.
pub struct Project {
    pub dir: PathBuf,
    pub manifest: Option<StrideManifest>,
    pub target: Option<String>,
    pub resources: Option<PathBuf>,
}

impl Project {
    pub fn target_id(&self, name: Option<&str>) -> Result<TargetId> {
        resolve_target(name.or(self.target.as_deref()), self.manifest.as_ref())
    }

    /// Override file in the project directory, then `[device]` from stride.toml.
    pub fn overrides(&self, id: TargetId) -> Result<ConfigOverrides> {
        let file = load_overrides_for(&self.dir, id)
            .with_context(|| format!("loading overrides for {id}"))?;
        Ok(match &self.manifest {
            Some(manifest) => merge_overrides(file, &manifest.device_overrides()),
            None => file,
        })
    }

    pub fn tools_dir(&self) -> PathBuf {
        let dir = self
            .manifest
            .as_ref()
            .and_then(|m| m.toolchain.dir.as_deref())
            .unwrap_or("tools");
        self.dir.join(dir)
    }

    pub fn build_dir(&self) -> PathBuf {
        let dir = self
            .manifest
            .as_ref()
            .and_then(|m| m.build.dir.as_deref())
            .unwrap_or("build");
        self.dir.join(dir)
    }

    fn resources_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.resources {
            return Some(dir.clone());
        }
        self.manifest
            .as_ref()
            .and_then(|m| m.toolchain.resources.as_deref())
            .map(|dir| self.dir.join(dir))
    }

    fn load_resources(&self, id: TargetId, host: HostOs) -> Result<PlatformResources> {
        if let Some(dir) = self.resources_dir() {
            let mcu = builtin_config(id).mcu_type_name;
            return PlatformResources::from_dir(&dir, &mcu, host)
                .with_context(|| format!("loading resources from {}", dir.display()));
        }
        #[cfg(feature = "embedded-resources")]
        {
            Ok(stride_platform::embedded_resources(id))
        }
        #[cfg(not(feature = "embedded-resources"))]
        {
            log::debug!("no resource directory configured; toolchain archives unavailable");
            Ok(PlatformResources::empty())
        }
    }

    /// The platform for the selected target on this host.
    pub fn platform(&self) -> Result<Box<dyn Platform>> {
        let host = HostOs::current()?;
        self.platform_for(host)
    }

    pub fn platform_for(&self, host: HostOs) -> Result<Box<dyn Platform>> {
        let id = self.target_id(None)?;
        let resources = self.load_resources(id, host)?;
        let overrides = self.overrides(id)?;
        Ok(select_platform(id, host, resources, &overrides)?)
    }
}

/// Write `content` to `dir/name`, creating `dir`.
pub fn write_script(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("  wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
pub(crate) fn test_project(dir: &Path) -> Project {
    Project {
        dir: dir.to_path_buf(),
        manifest: None,
        target: None,
        resources: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locations() {
        let dir = tempfile::tempdir().unwrap();
        let project = test_project(dir.path());
        assert_eq!(project.tools_dir(), dir.path().join("tools"));
        assert_eq!(project.build_dir(), dir.path().join("build"));
        assert_eq!(project.target_id(None).unwrap(), TargetId::Rpi4b);
    }

    #[test]
    fn manifest_device_reaches_platform() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = StrideManifest::parse(
            "[project]\nname = \"p\"\n[device]\naddress = \"10.9.8.7\"\n[toolchain]\ndir = \"sdk\"\n",
        )
        .unwrap();
        let project = Project {
            manifest: Some(manifest),
            ..test_project(dir.path())
        };
        assert_eq!(project.tools_dir(), dir.path().join("sdk"));
        let platform = project.platform_for(HostOs::Linux).unwrap();
        assert_eq!(platform.config().device_address, "10.9.8.7");
    }
}
