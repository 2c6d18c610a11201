//! `stride target`: platform listing, description and validation.

use anyhow::{bail, Result};
use stride_platform::{builtin_config, TargetId};
use stride_targets::{config_to_toml, validate_config, PlatformConfig};

use super::Project;

/// List all available platforms.
pub fn list() -> Result<()> {
    println!("Available targets:");
    println!();
    for id in TargetId::all() {
        println!("  {:<12} {}", id.as_str(), id.description());
    }
    println!();
    println!("Use 'stride target describe <name>' for details.");
    Ok(())
}

/// Effective configuration: built-in constants plus project overrides.
fn effective_config(project: &Project, id: TargetId) -> Result<PlatformConfig> {
    Ok(project.overrides(id)?.apply(&builtin_config(id)))
}

/// Describe a platform's effective configuration.
pub fn describe(project: &Project, name: Option<&str>, format: Option<&str>) -> Result<()> {
    let id = project.target_id(name)?;
    let config = effective_config(project, id)?;

    match format {
        Some("toml") => {
            print!("{}", config_to_toml(&config)?);
            return Ok(());
        }
        Some(other) if other != "human" => bail!("unknown format '{other}' (expected human or toml)"),
        _ => {}
    }

    println!("=== Target: {id} ===");
    println!("{}", id.description());
    println!();

    println!("--- Toolchain ---");
    println!("  Prefix:  {}", config.tool_prefix());
    println!("  Version: {}", config.toolchain_version);
    println!("  Core:    {}", config.core_library_filename());
    println!();

    println!("--- Artifacts ---");
    println!("  Image:        {}", config.build_output_binary);
    println!("  Programming:  {}", config.programming_file);
    println!("  Linker:       {}", config.linker_filename);
    println!("  Device image: {}", config.legacy_image_name);
    println!();

    println!("--- Resources ---");
    println!(
        "  Flash: {} bytes (limit {:.0}%)",
        config.program_flash_max_size,
        config.common_safety_ratio * 100.0
    );
    println!(
        "  RAM:   {} bytes (ram0 limit {:.0}%, ram1 limit {:.0}%)",
        config.program_ram_size,
        config.program_ram0_safety_ratio * 100.0,
        config.program_ram1_safety_ratio * 100.0
    );
    println!(
        "  CPU:   base {:.1}%, limit {:.1}%",
        config.base_cpu_load_percent, config.cpu_safety_threshold
    );
    println!(
        "  Audio: {} samples at {} Hz, {} buffers",
        config.audio_block_samples, config.audio_sample_rate, config.base_audio_buffers
    );
    println!();

    println!("--- Device ---");
    println!("  Product: {} (rev {})", config.product_name, config.board_revision);
    println!("  Address: {}", config.device_address);
    println!("  Timeout: {} s", config.transfer_timeout_secs);

    Ok(())
}

/// Validate a platform's effective configuration.
pub fn validate(project: &Project, name: Option<&str>) -> Result<()> {
    let id = project.target_id(name)?;
    let config = effective_config(project, id)?;

    match validate_config(&config) {
        Ok(()) => {
            println!("{id}: configuration is valid");
            Ok(())
        }
        Err(issues) => {
            let mut errors = 0;
            for issue in &issues {
                println!("  {}: {}", issue.severity, issue.message);
                if issue.severity == "error" {
                    errors += 1;
                }
            }
            if errors > 0 {
                bail!("{id}: {errors} configuration error(s)");
            }
            println!("{id}: configuration is valid with {} warning(s)", issues.len());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_project;
    use stride_platform::overrides_path;

    #[test]
    fn list_runs() {
        assert!(list().is_ok());
    }

    #[test]
    fn describe_default_target() {
        let dir = tempfile::tempdir().unwrap();
        let project = test_project(dir.path());
        assert!(describe(&project, None, None).is_ok());
        assert!(describe(&project, Some("rpi4b"), Some("toml")).is_ok());
        assert!(describe(&project, Some("rpi4b"), Some("yaml")).is_err());
    }

    #[test]
    fn describe_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        assert!(describe(&test_project(dir.path()), Some("nonexistent"), None).is_err());
    }

    #[test]
    fn validate_rejects_bad_override() {
        let dir = tempfile::tempdir().unwrap();
        let project = test_project(dir.path());
        assert!(validate(&project, None).is_ok());

        std::fs::write(
            overrides_path(dir.path(), TargetId::Rpi4b),
            "program-ram0-safety-ratio = 0.0\n",
        )
        .unwrap();
        assert!(validate(&project, None).is_err());
    }
}
