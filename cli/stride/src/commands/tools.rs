//! `stride tools`: toolchain extraction.

use std::path::Path;

use anyhow::{Context, Result};
use stride_platform::{ExtractionOutcome, Platform};

use super::Project;

/// Extract the host toolchain unless the directory already exists.
pub fn extract(project: &Project, dir: Option<&Path>) -> Result<()> {
    let platform = project.platform()?;
    let tools_dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => project.tools_dir(),
    };
    extract_with(platform.as_ref(), &tools_dir)
}

fn extract_with(platform: &dyn Platform, tools_dir: &Path) -> Result<()> {
    let outcome = platform
        .unzip_build_tools(tools_dir)
        .with_context(|| format!("extracting {} toolchain", platform.id()))?;

    match outcome {
        ExtractionOutcome::AlreadyPresent => {
            println!("Toolchain already present in {}", tools_dir.display());
        }
        ExtractionOutcome::Extracted(summary) => {
            println!(
                "Extracted {} files from {} archive(s) into {}",
                summary.files,
                summary.archives,
                tools_dir.display()
            );
            if let Some(report) = summary.permissions {
                println!("  executables updated: {}", report.updated);
                if !report.is_clean() {
                    println!(
                        "  warning: {} file(s) could not be made executable, {} directory(ies) missing",
                        report.failed.len(),
                        report.missing_dirs.len()
                    );
                }
            }
        }
    }
    Ok(())
}
