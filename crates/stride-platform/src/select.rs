//! Choosing the platform for a target identifier.

use std::path::{Path, PathBuf};

use stride_targets::{load_overrides_toml, ConfigOverrides, HostOs, PlatformConfig, TargetId};

use crate::error::Result;
use crate::platform::Platform;
use crate::resources::PlatformResources;
use crate::rpi4b::Rpi4b;

/// Build the platform for `id`, with `overrides` merged over its built-in
/// configuration and the result validated.
pub fn select_platform(
    id: TargetId,
    host: HostOs,
    resources: PlatformResources,
    overrides: &ConfigOverrides,
) -> Result<Box<dyn Platform>> {
    log::debug!("selecting platform {id} for host {host}");
    match id {
        TargetId::Rpi4b => Ok(Box::new(Rpi4b::with_overrides(host, resources, overrides)?)),
    }
}

/// Built-in configuration of `id`, before any overrides.
pub fn builtin_config(id: TargetId) -> PlatformConfig {
    match id {
        TargetId::Rpi4b => Rpi4b::configure(),
    }
}

/// Archives compiled into the binary for `id`.
#[cfg(feature = "embedded-resources")]
pub fn embedded_resources(id: TargetId) -> PlatformResources {
    match id {
        TargetId::Rpi4b => Rpi4b::embedded_resources(),
    }
}

/// `<dir>/<target>.platform.toml`
pub fn overrides_path(dir: &Path, id: TargetId) -> PathBuf {
    dir.join(format!("{}.platform.toml", id.as_str()))
}

/// Overrides for `id` from `dir`, or none if the project has no override file.
pub fn load_overrides_for(dir: &Path, id: TargetId) -> Result<ConfigOverrides> {
    let path = overrides_path(dir, id);
    if !path.is_file() {
        return Ok(ConfigOverrides::default());
    }
    log::info!("using platform overrides from {}", path.display());
    Ok(load_overrides_toml(&path)?)
}
