//! `stride check`: resource budget validation of a linked image.

use std::path::Path;

use anyhow::{bail, Context, Result};
use stride_platform::Platform;

use super::Project;

pub fn run(project: &Project, image: &Path, cpu: Option<f64>) -> Result<()> {
    let platform = project.platform()?;
    check_with(platform.as_ref(), image, cpu)
}

fn check_with(platform: &dyn Platform, image: &Path, cpu: Option<f64>) -> Result<()> {
    let footprint = platform
        .measure_image(image)
        .with_context(|| format!("measuring {}", image.display()))?;
    println!("=== Budget: {} on {} ===", image.display(), platform.id());
    println!("  {footprint}");
    println!();

    let ram = platform.check_program_ram(image)?;
    let flash = platform.check_program_flash(image)?;
    print!("{ram}{flash}");

    let mut failures = Vec::new();
    if !ram.fits() {
        failures.push("RAM");
    }
    if !flash.fits() {
        failures.push("flash");
    }
    if let Some(estimate) = cpu {
        let report = platform.check_cpu_load(estimate);
        print!("{report}");
        if !report.fits() {
            failures.push("CPU");
        }
    }

    if !failures.is_empty() {
        bail!("{} exceeds the {} budget", image.display(), failures.join(" and "));
    }
    println!();
    println!("Image fits.");
    Ok(())
}
