//! Executable permission repair.
//!
//! Zip archives produced on other hosts do not reliably carry Unix mode bits,
//! so compiler binaries come out non-executable. Repair is best effort: every
//! failure is logged and counted, and the missing bit surfaces later as a
//! compiler invocation error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a permission repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionReport {
    /// Files that are now executable.
    pub updated: usize,
    /// Files whose permissions could not be changed.
    pub failed: Vec<PathBuf>,
    /// Directories that were expected but held no files.
    pub missing_dirs: Vec<PathBuf>,
}

impl PermissionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.missing_dirs.is_empty()
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let meta = fs::metadata(path)?;
    let mut perms = meta.permissions();
    let mode = perms.mode();
    let wanted = mode | 0o111;
    if wanted != mode {
        perms.set_mode(wanted);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(path: &Path) -> io::Result<()> {
    fs::metadata(path).map(|_| ())
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn repair_file(path: &Path, report: &mut PermissionReport) {
    match set_executable(path) {
        Ok(()) => {
            log::info!("changed execute permission on {}", path.display());
            report.updated += 1;
        }
        Err(e) => {
            log::error!("error changing execute permission on {}: {e}", path.display());
            report.failed.push(path.to_path_buf());
        }
    }
}

/// Mark every file directly inside `dirs`, plus each of `extra_files`, executable.
///
/// Subdirectories are not descended into.
pub fn repair_executable_permissions(dirs: &[PathBuf], extra_files: &[PathBuf]) -> PermissionReport {
    let mut report = PermissionReport::default();

    for dir in dirs {
        let files = match list_files(dir) {
            Ok(files) => files,
            Err(e) => {
                log::error!(
                    "unable to find tool binaries for setting executable in {}: {e}",
                    dir.display()
                );
                report.missing_dirs.push(dir.clone());
                continue;
            }
        };
        if files.is_empty() {
            log::error!(
                "unable to find tool binaries for setting executable in {}",
                dir.display()
            );
            report.missing_dirs.push(dir.clone());
            continue;
        }
        for file in &files {
            repair_file(file, &mut report);
        }
    }

    for file in extra_files {
        if file.exists() {
            repair_file(file, &mut report);
        } else {
            log::warn!("expected executable {} is missing", file.display());
            report.failed.push(file.clone());
        }
    }

    report
}
