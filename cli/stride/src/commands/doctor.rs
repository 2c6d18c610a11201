//! `stride doctor`: toolchain and project diagnostics.

use std::process::Command;

use anyhow::Result;
use stride_platform::{HostOs, Platform};
use stride_toolchain::{ExtractionManifest, ToolchainState};

use super::Project;

/// Print diagnostic information about the host, project and toolchain.
pub fn run(project: &Project) -> Result<()> {
    println!("=== Stride Doctor ===");
    println!();
    println!("Stride version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Embedded resources: {}",
        if cfg!(feature = "embedded-resources") {
            "compiled in"
        } else {
            "not compiled (rebuild with --features embedded-resources)"
        }
    );
    println!();

    println!("--- Host ---");
    match HostOs::current() {
        Ok(host) => println!("  OS: {host}"),
        Err(e) => println!("  OS: {e}"),
    }
    print_tool_status("make", &["--version"]);
    print_tool_status("tftp", &["-V"]);
    println!();

    println!("--- Project ---");
    match &project.manifest {
        Some(manifest) => {
            println!("  stride.toml: found at {}", project.dir.display());
            println!("  Project:     {} {}", manifest.project.name, manifest.project.version);
        }
        None => println!("  stride.toml: not found"),
    }
    println!();

    match project.platform() {
        Ok(platform) => report_platform(project, platform.as_ref()),
        Err(e) => println!("  platform unavailable: {e:#}"),
    }
    Ok(())
}

fn report_platform(project: &Project, platform: &dyn Platform) {
    let config = platform.config();
    println!("--- Target: {} ---", platform.id());
    println!("  Toolchain: {} {}", config.toolchain_prefix, config.toolchain_version);
    println!("  Device:    {}", config.device_address);
    println!(
        "  Archives:  {} toolchain, core includes {} bytes, core libs {} bytes",
        platform.toolchain().archives().len(),
        platform.core_includes_zip().len(),
        platform.core_libs_zip().len()
    );

    let tools_dir = project.tools_dir();
    let state = ToolchainState::detect(&tools_dir);
    println!("  Tools dir: {} ({state})", tools_dir.display());
    if state != ToolchainState::Present {
        return;
    }
    match ExtractionManifest::read(&tools_dir) {
        Ok(Some(record)) => {
            println!(
                "  Extracted: {} files from {} archive(s) for {}",
                record.files,
                record.archives.len(),
                record.host
            );
            if platform.toolchain().archives().is_empty() {
                println!("  Integrity: no archives loaded to compare against");
            } else if record.matches(platform.toolchain().archives()) {
                println!("  Integrity: matches the loaded archives");
            } else {
                println!("  Integrity: differs from the loaded archives (delete the directory to re-extract)");
            }
        }
        Ok(None) => println!("  Integrity: no extraction record"),
        Err(e) => println!("  Integrity: unreadable record: {e}"),
    }
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}
