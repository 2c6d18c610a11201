//! `stride scripts` and `stride test-makefile`: build script generation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stride_platform::{BuildFlags, ErrorKind, Platform, TestMakefileRequest};
use stride_scripts::ScriptKind;

use super::{write_script, Project};

/// Options for `makefile.inc`, starting from `[build]` in stride.toml.
#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    pub flags: BuildFlags,
    pub cpp_flags: String,
    pub verbose_recipes: bool,
}

impl ScriptOptions {
    pub fn from_project(project: &Project) -> Self {
        match &project.manifest {
            Some(manifest) => Self {
                flags: manifest.build.flags,
                cpp_flags: manifest.build.cpp_flags.clone().unwrap_or_default(),
                verbose_recipes: manifest.build.verbose_recipes,
            },
            None => Self::default(),
        }
    }
}

/// Write every script the target supports on this host.
pub fn run(project: &Project, out: Option<&Path>, options: &ScriptOptions) -> Result<()> {
    let platform = project.platform()?;
    let out_dir = out.map(Path::to_path_buf).unwrap_or_else(|| project.build_dir());
    write_all(platform.as_ref(), &out_dir, options).map(|_| ())
}

fn write_all(platform: &dyn Platform, out_dir: &Path, options: &ScriptOptions) -> Result<Vec<PathBuf>> {
    println!("Generating {} scripts for host {}", platform.id(), platform.host());
    let config = platform.config();
    let mut written = Vec::new();

    written.push(write_script(out_dir, &config.linker_filename, &platform.linker_file()?)?);

    match platform.makefile() {
        Ok(text) => written.push(write_script(out_dir, ScriptKind::Makefile.default_file_name(), &text)?),
        Err(e) if e.kind() == ErrorKind::UnsupportedTarget => println!("  skipped: {e}"),
        Err(e) => return Err(e.into()),
    }

    let inc = platform
        .emitter()
        .with_quiet_recipes(!options.verbose_recipes)
        .library_makefile_inc(&options.flags, &options.cpp_flags);
    match inc {
        Ok(text) => written.push(write_script(
            out_dir,
            ScriptKind::LibraryMakefileInc.default_file_name(),
            &text,
        )?),
        Err(e @ stride_scripts::ScriptError::UnsupportedTarget { .. }) => println!("  skipped: {e}"),
        Err(e) => return Err(e.into()),
    }

    Ok(written)
}

/// Caller-supplied parts of the test-harness Makefile.
#[derive(Debug, Clone)]
pub struct TestMakefileArgs {
    pub libs_dir: PathBuf,
    pub dat: String,
    pub app: String,
    pub ir_data: String,
    pub include_dirs: Vec<String>,
}

/// Write the test-harness Makefile.
pub fn test_makefile(project: &Project, args: &TestMakefileArgs, out: Option<&Path>) -> Result<()> {
    let platform = project.platform()?;
    let out_dir = out.map(Path::to_path_buf).unwrap_or_else(|| project.build_dir());
    write_test_makefile(platform.as_ref(), &project.tools_dir(), args, &out_dir).map(|_| ())
}

fn write_test_makefile(
    platform: &dyn Platform,
    tools_dir: &Path,
    args: &TestMakefileArgs,
    out_dir: &Path,
) -> Result<PathBuf> {
    let request = TestMakefileRequest {
        tools_dir: tools_dir.display().to_string(),
        libs_dir: args.libs_dir.display().to_string(),
        dat_filename: args.dat.clone(),
        test_app_name: args.app.clone(),
        ir_data_name: args.ir_data.clone(),
        include_dirs: args.include_dirs.clone(),
    };
    let text = platform
        .test_makefile(&request)
        .context("generating test Makefile")?;
    write_script(out_dir, ScriptKind::TestMakefile.default_file_name(), &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_platform::{HostOs, PlatformResources, Rpi4b};

    fn platform(host: HostOs) -> Rpi4b {
        Rpi4b::new(host, PlatformResources::empty()).unwrap()
    }

    #[test]
    fn linux_writes_three_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_all(&platform(HostOs::Linux), dir.path(), &ScriptOptions::default()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("linker.ld").is_file());
        assert!(dir.path().join("Makefile").is_file());
        let inc = std::fs::read_to_string(dir.path().join("makefile.inc")).unwrap();
        assert!(inc.contains("TMOD=@"));
    }

    #[test]
    fn verbose_recipes_clear_tmod() {
        let dir = tempfile::tempdir().unwrap();
        let options = ScriptOptions {
            verbose_recipes: true,
            ..Default::default()
        };
        write_all(&platform(HostOs::Linux), dir.path(), &options).unwrap();
        let inc = std::fs::read_to_string(dir.path().join("makefile.inc")).unwrap();
        assert!(!inc.contains("TMOD=@"));
    }

    #[test]
    fn windows_writes_linker_script_only() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_all(&platform(HostOs::Windows), dir.path(), &ScriptOptions::default()).unwrap();
        assert_eq!(written, [dir.path().join("linker.ld")]);
    }

    #[test]
    fn test_makefile_written() {
        let dir = tempfile::tempdir().unwrap();
        let args = TestMakefileArgs {
            libs_dir: PathBuf::from("libs"),
            dat: "reverb.dat".into(),
            app: "reverbTest".into(),
            ir_data: "irData".into(),
            include_dirs: vec!["include".into()],
        };
        let path = write_test_makefile(&platform(HostOs::MacOs), Path::new("/opt/tools"), &args, dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("reverbTest"));
        assert!(text.contains("AVALON_REV=2"));
    }

    #[test]
    fn bad_app_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = TestMakefileArgs {
            libs_dir: PathBuf::from("libs"),
            dat: "reverb.dat".into(),
            app: "two words".into(),
            ir_data: "irData".into(),
            include_dirs: vec![],
        };
        assert!(write_test_makefile(&platform(HostOs::Linux), Path::new("/opt/tools"), &args, dir.path()).is_err());
    }
}
