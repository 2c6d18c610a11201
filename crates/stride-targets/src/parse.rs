//! TOML overrides and validation for platform configurations.
//!
//! A target's constants come from its `configure()` implementation. Projects
//! may adjust a subset of them (device address, limits, ratios) with a
//! `<target>.platform.toml` file; the overrides are merged on top and the
//! result is validated before a platform is handed out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{MemoryMap, PlatformConfig};
use crate::error::{Result, TargetError};

/// Longest accepted device transfer, in seconds.
pub const MAX_TRANSFER_TIMEOUT_SECS: u64 = 3600;

/// A validation issue found in a platform configuration.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Optional replacements for fields of a [`PlatformConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub toolchain_prefix: Option<String>,
    pub toolchain_version: Option<String>,
    pub build_output_binary: Option<String>,
    pub programming_file: Option<String>,
    pub linker_filename: Option<String>,
    pub legacy_image_name: Option<String>,
    pub program_flash_max_size: Option<u64>,
    pub program_ram_size: Option<u64>,
    pub program_ram0_safety_ratio: Option<f64>,
    pub program_ram1_safety_ratio: Option<f64>,
    pub cpu_safety_threshold: Option<f64>,
    pub common_safety_ratio: Option<f64>,
    pub product_name: Option<String>,
    pub board_revision: Option<u32>,
    pub core_version: Option<semver::Version>,
    pub extra_include_libs: Option<Vec<String>>,
    pub memory_map: Option<MemoryMap>,
    pub device_address: Option<String>,
    pub transfer_timeout_secs: Option<u64>,
}

macro_rules! merge_fields {
    ($overrides:expr, $config:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$overrides.$field {
                $config.$field = value.clone();
            }
        )+
    };
}

impl ConfigOverrides {
    /// Return `base` with every present override applied.
    pub fn apply(&self, base: &PlatformConfig) -> PlatformConfig {
        let mut config = base.clone();
        merge_fields!(
            self,
            config,
            toolchain_prefix,
            toolchain_version,
            build_output_binary,
            programming_file,
            linker_filename,
            legacy_image_name,
            program_flash_max_size,
            program_ram_size,
            program_ram0_safety_ratio,
            program_ram1_safety_ratio,
            cpu_safety_threshold,
            common_safety_ratio,
            product_name,
            board_revision,
            core_version,
            extra_include_libs,
            memory_map,
            device_address,
            transfer_timeout_secs,
        );
        config
    }

    /// Whether no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }
}

/// Load overrides from a `.platform.toml` file.
pub fn load_overrides_toml(path: &Path) -> Result<ConfigOverrides> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_overrides_toml(&content)
}

/// Parse overrides from a TOML string.
pub fn parse_overrides_toml(toml_str: &str) -> Result<ConfigOverrides> {
    let overrides: ConfigOverrides = toml::from_str(toml_str)?;
    Ok(overrides)
}

/// Serialize a full configuration to pretty TOML.
pub fn config_to_toml(config: &PlatformConfig) -> Result<String> {
    let toml_str = toml::to_string_pretty(config)?;
    Ok(toml_str)
}

fn ratio_in_range(name: &str, value: f64, issues: &mut Vec<ValidationIssue>) {
    if !(value > 0.0 && value <= 1.0) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("{name} ({value}) must lie in (0, 1]"),
        });
    }
}

/// Validate a platform configuration against its invariants.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with every problem found.
/// Warnings alone also produce `Err`; callers decide whether to proceed.
pub fn validate_config(config: &PlatformConfig) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // 1. Toolchain identity
    if config.toolchain_prefix.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "toolchain-prefix is empty".into(),
        });
    }
    if config.toolchain_prefix.ends_with('-') {
        issues.push(ValidationIssue {
            severity: "warning",
            message: format!(
                "toolchain-prefix '{}' ends with '-'; the dash is added by the script emitter",
                config.toolchain_prefix
            ),
        });
    }
    if config.toolchain_version.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "toolchain-version is empty".into(),
        });
    }

    // 2. Sizes
    if config.program_flash_max_size == 0 {
        issues.push(ValidationIssue {
            severity: "error",
            message: "program-flash-max-size must be positive".into(),
        });
    }
    if config.program_ram_size == 0 {
        issues.push(ValidationIssue {
            severity: "error",
            message: "program-ram-size must be positive".into(),
        });
    }

    // 3. Ratios
    ratio_in_range("program-ram0-safety-ratio", config.program_ram0_safety_ratio, &mut issues);
    ratio_in_range("program-ram1-safety-ratio", config.program_ram1_safety_ratio, &mut issues);
    ratio_in_range("common-safety-ratio", config.common_safety_ratio, &mut issues);

    // 4. CPU threshold is a percentage
    if !(config.cpu_safety_threshold > 0.0 && config.cpu_safety_threshold <= 100.0) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "cpu-safety-threshold ({}) must lie in (0, 100]",
                config.cpu_safety_threshold
            ),
        });
    } else if config.base_cpu_load_percent >= config.cpu_safety_threshold {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "base-cpu-load-percent ({}) already reaches cpu-safety-threshold ({})",
                config.base_cpu_load_percent, config.cpu_safety_threshold
            ),
        });
    }

    // 5. Artifact names
    for (name, value) in [
        ("build-output-binary", &config.build_output_binary),
        ("programming-file", &config.programming_file),
        ("linker-filename", &config.linker_filename),
        ("legacy-image-name", &config.legacy_image_name),
    ] {
        if value.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("{name} is empty"),
            });
        }
    }

    // 6. Deployment
    if config.transfer_timeout_secs == 0 {
        issues.push(ValidationIssue {
            severity: "error",
            message: "transfer-timeout-secs must be positive".into(),
        });
    } else if config.transfer_timeout_secs > MAX_TRANSFER_TIMEOUT_SECS {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "transfer-timeout-secs ({}) exceeds the maximum of {MAX_TRANSFER_TIMEOUT_SECS}",
                config.transfer_timeout_secs
            ),
        });
    }
    if config.device_address.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "device-address is empty; programming will fail".into(),
        });
    }

    // 7. Memory map
    if config.memory_map.flash_sections.is_empty() {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "memory-map has no flash sections; flash usage will always read 0".into(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Collapse validation issues into a single error if any of them is an error.
pub fn require_valid(config: &PlatformConfig) -> Result<()> {
    match validate_config(config) {
        Ok(()) => Ok(()),
        Err(issues) => {
            let errors: Vec<_> = issues
                .iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message.as_str())
                .collect();
            if errors.is_empty() {
                Ok(())
            } else {
                Err(TargetError::Validation {
                    detail: errors.join("; "),
                })
            }
        }
    }
}
