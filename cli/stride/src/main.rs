//! Stride CLI: toolchain, build scripts, budget checks and device programming
//! for Stride firmware targets.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use manifest::StrideManifest;

#[derive(Parser)]
#[command(name = "stride", version, about = "Stride firmware platform tool")]
struct Cli {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Target platform (default: from stride.toml, else rpi4b)
    #[arg(long, global = true)]
    target: Option<String>,
    /// Directory holding the BSP and toolchain archives
    #[arg(long, global = true)]
    resources: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect target platforms
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Manage the cross toolchain
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },
    /// Write the linker script, Makefile and makefile.inc
    Scripts {
        /// Output directory (default: build dir from stride.toml, else build)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Use the debug flag set
        #[arg(long)]
        debug: bool,
        /// Optimise with -O3 instead of -O2
        #[arg(long)]
        o3: bool,
        /// Add -ffast-math to release flags
        #[arg(long)]
        fast_math: bool,
        /// Compile out effect printf support
        #[arg(long)]
        no_printf: bool,
        /// Extra preprocessor flags for library builds
        #[arg(long)]
        cpp_flags: Option<String>,
        /// Echo make recipes
        #[arg(long)]
        verbose_recipes: bool,
    },
    /// Write the test-harness Makefile
    TestMakefile {
        /// Directory holding the prebuilt core library
        #[arg(long)]
        libs_dir: PathBuf,
        /// Effect library archive linked into the test application
        #[arg(long)]
        dat: String,
        /// Test application name
        #[arg(long)]
        app: String,
        /// Impulse-response data object name
        #[arg(long)]
        ir_data: String,
        /// Include directory (repeatable, in search order)
        #[arg(long = "include")]
        include_dirs: Vec<String>,
        /// Output directory (default: build dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a linked ELF image against the target's budgets
    Check {
        /// Linked ELF image
        image: PathBuf,
        /// Estimated effect CPU load in percent
        #[arg(long)]
        cpu: Option<f64>,
    },
    /// Transfer an image to the device
    Program {
        /// Image to transfer (default: build dir / programming file)
        image: Option<PathBuf>,
    },
    /// Check toolchain and project status
    Doctor,
}

#[derive(Subcommand)]
enum TargetAction {
    /// List available target platforms
    List,
    /// Show the effective configuration of a target
    Describe {
        /// Target name (default: current target)
        name: Option<String>,
        /// Output format (default: human-readable, "toml" for TOML)
        #[arg(long)]
        format: Option<String>,
    },
    /// Validate a target's effective configuration
    Validate {
        /// Target name (default: current target)
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum ToolsAction {
    /// Extract the toolchain for this host unless already present
    Extract {
        /// Destination (default: toolchain dir from stride.toml, else tools)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (manifest, project_dir) = load_manifest_optional(&cwd)?;
    let project = commands::Project {
        dir: project_dir.unwrap_or(cwd),
        manifest,
        target: cli.target,
        resources: cli.resources,
    };

    match cli.command {
        Commands::Target { action } => match action {
            TargetAction::List => commands::target::list(),
            TargetAction::Describe { name, format } => {
                commands::target::describe(&project, name.as_deref(), format.as_deref())
            }
            TargetAction::Validate { name } => commands::target::validate(&project, name.as_deref()),
        },

        Commands::Tools { action } => match action {
            ToolsAction::Extract { dir } => commands::tools::extract(&project, dir.as_deref()),
        },

        Commands::Scripts {
            out,
            debug,
            o3,
            fast_math,
            no_printf,
            cpp_flags,
            verbose_recipes,
        } => {
            let mut options = commands::scripts::ScriptOptions::from_project(&project);
            options.flags.is_debug |= debug;
            options.flags.enable_o3 |= o3;
            options.flags.enable_fast_math |= fast_math;
            options.flags.no_printf |= no_printf;
            options.verbose_recipes |= verbose_recipes;
            if let Some(cpp) = cpp_flags {
                options.cpp_flags = cpp;
            }
            commands::scripts::run(&project, out.as_deref(), &options)
        }

        Commands::TestMakefile {
            libs_dir,
            dat,
            app,
            ir_data,
            include_dirs,
            out,
        } => commands::scripts::test_makefile(
            &project,
            &commands::scripts::TestMakefileArgs {
                libs_dir,
                dat,
                app,
                ir_data,
                include_dirs,
            },
            out.as_deref(),
        ),

        Commands::Check { image, cpu } => commands::check::run(&project, &image, cpu),

        Commands::Program { image } => commands::program::run(&project, image.as_deref()),

        Commands::Doctor => commands::doctor::run(&project),
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<StrideManifest>, Option<PathBuf>)> {
    match StrideManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["stride", "check", "Avalon.elf", "--cpu", "40", "-vv", "--target", "rpi4b"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.target.as_deref(), Some("rpi4b"));
        match cli.command {
            Commands::Check { image, cpu } => {
                assert_eq!(image, PathBuf::from("Avalon.elf"));
                assert_eq!(cpu, Some(40.0));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn repeated_includes_keep_order() {
        let cli = Cli::try_parse_from([
            "stride",
            "test-makefile",
            "--libs-dir",
            "libs",
            "--dat",
            "reverb.dat",
            "--app",
            "reverbTest",
            "--ir-data",
            "irData",
            "--include",
            "include",
            "--include",
            "effects/reverb",
        ])
        .unwrap();
        match cli.command {
            Commands::TestMakefile { include_dirs, .. } => {
                assert_eq!(include_dirs, ["include", "effects/reverb"]);
            }
            _ => panic!("expected test-makefile"),
        }
    }
}
