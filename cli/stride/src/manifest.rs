//! `stride.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stride_targets::{BuildFlags, ConfigOverrides, TargetId};

/// The top-level manifest structure for a Stride project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrideManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Target selection.
    #[serde(default)]
    pub target: TargetConfig,
    /// Toolchain locations.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Device connection.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Build script options.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Project version.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target identifier (default: rpi4b).
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolchainConfig {
    /// Where the toolchain is extracted, relative to the project (default: tools).
    #[serde(default)]
    pub dir: Option<String>,
    /// Directory holding the BSP and toolchain archives.
    #[serde(default)]
    pub resources: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceConfig {
    /// Network address of the board.
    #[serde(default)]
    pub address: Option<String>,
    /// Transfer timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Output directory for generated scripts (default: build).
    #[serde(default)]
    pub dir: Option<String>,
    /// Extra preprocessor flags for library builds.
    #[serde(default)]
    pub cpp_flags: Option<String>,
    /// Echo make recipes instead of running them quietly.
    #[serde(default)]
    pub verbose_recipes: bool,
    #[serde(flatten)]
    pub flags: BuildFlags,
}

impl StrideManifest {
    /// Search upward from `start_dir` for a `stride.toml` file, parse and return
    /// it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join("stride.toml");
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest = Self::parse(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from TOML text.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.name.as_deref()
    }

    /// Device settings as configuration overrides.
    pub fn device_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            device_address: self.device.address.clone(),
            transfer_timeout_secs: self.device.timeout_secs,
            ..Default::default()
        }
    }
}

/// Resolve a target name, falling back to the manifest and then to rpi4b.
pub fn resolve_target(arg: Option<&str>, manifest: Option<&StrideManifest>) -> Result<TargetId> {
    let name = arg
        .or_else(|| manifest.and_then(StrideManifest::target_name))
        .unwrap_or("rpi4b");
    Ok(name.parse::<TargetId>()?)
}

/// Merge `extra` over `base`, field by field.
pub fn merge_overrides(base: ConfigOverrides, extra: &ConfigOverrides) -> ConfigOverrides {
    ConfigOverrides {
        device_address: extra.device_address.clone().or(base.device_address),
        transfer_timeout_secs: extra.transfer_timeout_secs.or(base.transfer_timeout_secs),
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[target]
name = "rpi4b"

[toolchain]
dir = "tools"

[device]
address = "192.168.1.27"
"#
        )
    }

    #[test]
    fn parse_full_manifest() {
        let toml = r#"
[project]
name = "plate-reverb"
version = "1.2.0"

[target]
name = "rpi4b"

[toolchain]
dir = "../tools"
resources = "/opt/stride/resources"

[device]
address = "10.0.0.40"
timeout-secs = 20

[build]
dir = "out"
cpp-flags = "-DREVERB_TAPS=8"
enable-o3 = true
no-printf = true
"#;
        let manifest = StrideManifest::parse(toml).unwrap();
        assert_eq!(manifest.project.name, "plate-reverb");
        assert_eq!(manifest.target_name(), Some("rpi4b"));
        assert_eq!(manifest.toolchain.dir.as_deref(), Some("../tools"));
        assert_eq!(manifest.device.timeout_secs, Some(20));
        assert!(manifest.build.flags.enable_o3);
        assert!(manifest.build.flags.no_printf);
        assert!(!manifest.build.flags.is_debug);
        assert!(!manifest.build.verbose_recipes);
        assert_eq!(manifest.build.cpp_flags.as_deref(), Some("-DREVERB_TAPS=8"));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = StrideManifest::parse("[project]\nname = \"tiny\"\n").unwrap();
        assert_eq!(manifest.project.version, "0.1.0");
        assert!(manifest.target_name().is_none());
        assert!(manifest.device_overrides().is_empty());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(StrideManifest::parse("[project\nname=").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let manifest = StrideManifest::parse(&template("delay")).unwrap();
        assert_eq!(manifest.project.name, "delay");
        assert_eq!(
            manifest.device_overrides().device_address.as_deref(),
            Some("192.168.1.27")
        );
    }

    #[test]
    fn target_resolution_order() {
        let manifest = StrideManifest::parse(&template("x")).unwrap();
        assert_eq!(resolve_target(None, None).unwrap(), TargetId::Rpi4b);
        assert_eq!(resolve_target(None, Some(&manifest)).unwrap(), TargetId::Rpi4b);
        assert!(resolve_target(Some("teensy41"), Some(&manifest)).is_err());
    }

    #[test]
    fn manifest_device_wins_over_override_file() {
        let file = ConfigOverrides {
            device_address: Some("10.0.0.1".into()),
            transfer_timeout_secs: Some(30),
            program_ram_size: Some(1024),
            ..Default::default()
        };
        let manifest = ConfigOverrides {
            device_address: Some("10.0.0.2".into()),
            ..Default::default()
        };
        let merged = merge_overrides(file, &manifest);
        assert_eq!(merged.device_address.as_deref(), Some("10.0.0.2"));
        assert_eq!(merged.transfer_timeout_secs, Some(30));
        assert_eq!(merged.program_ram_size, Some(1024));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stride.toml"), template("walk")).unwrap();
        let nested = dir.path().join("src/effects");
        std::fs::create_dir_all(&nested).unwrap();
        let (manifest, found) = StrideManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "walk");
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_returns_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StrideManifest::find_and_load(dir.path()).unwrap().is_none());
    }
}
