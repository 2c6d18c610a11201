//! One-shot extraction of a toolchain bundle into a tools directory.

use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use stride_targets::HostOs;

use crate::archive::ToolchainArchive;
use crate::error::{Result, ToolchainError};
use crate::layout::ToolchainLayout;
use crate::manifest::{ArchiveRecord, ExtractionManifest};
use crate::permissions::{repair_executable_permissions, PermissionReport};

/// Lifecycle of a tools directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainState {
    NotPresent,
    Extracting,
    Present,
    /// The last attempt failed and its partial output was removed.
    Failed,
}

impl ToolchainState {
    /// Presence check: the directory exists.
    pub fn detect(tools_dir: &Path) -> Self {
        if tools_dir.is_dir() {
            ToolchainState::Present
        } else {
            ToolchainState::NotPresent
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            ToolchainState::NotPresent => 0,
            ToolchainState::Extracting => 1,
            ToolchainState::Present => 2,
            ToolchainState::Failed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ToolchainState::Extracting,
            2 => ToolchainState::Present,
            3 => ToolchainState::Failed,
            _ => ToolchainState::NotPresent,
        }
    }
}

impl fmt::Display for ToolchainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolchainState::NotPresent => "not present",
            ToolchainState::Extracting => "extracting",
            ToolchainState::Present => "present",
            ToolchainState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What an extraction call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The directory already existed; nothing was touched.
    AlreadyPresent,
    /// Every archive was unpacked into a fresh directory.
    Extracted(ExtractionSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub archives: usize,
    pub files: usize,
    /// `None` on hosts that keep the executable bit.
    pub permissions: Option<PermissionReport>,
}

/// The compressed toolchain for one target on one host.
#[derive(Debug)]
pub struct ToolchainBundle {
    archives: Vec<ToolchainArchive>,
    layout: ToolchainLayout,
    host: HostOs,
    state: AtomicU8,
}

impl ToolchainBundle {
    pub fn new(archives: Vec<ToolchainArchive>, layout: ToolchainLayout, host: HostOs) -> Self {
        Self {
            archives,
            layout,
            host,
            state: AtomicU8::new(ToolchainState::NotPresent.to_u8()),
        }
    }

    pub fn archives(&self) -> &[ToolchainArchive] {
        &self.archives
    }

    pub fn layout(&self) -> &ToolchainLayout {
        &self.layout
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    /// State as last observed by this bundle.
    pub fn state(&self) -> ToolchainState {
        ToolchainState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ToolchainState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Extract into `tools_dir` unless it already exists.
    pub fn extract(&self, tools_dir: &Path) -> Result<ExtractionOutcome> {
        self.extract_with_cancel(tools_dir, &AtomicBool::new(false))
    }

    /// Like [`extract`](Self::extract), checking `cancel` before each archive.
    ///
    /// On any failure the directory is removed so that a later call starts
    /// from scratch.
    pub fn extract_with_cancel(
        &self,
        tools_dir: &Path,
        cancel: &AtomicBool,
    ) -> Result<ExtractionOutcome> {
        self.extract_archives(tools_dir, cancel, |_| {})
    }

    /// Extraction loop. `after_archive` runs with the index of each archive
    /// once it has been unpacked.
    fn extract_archives(
        &self,
        tools_dir: &Path,
        cancel: &AtomicBool,
        mut after_archive: impl FnMut(usize),
    ) -> Result<ExtractionOutcome> {
        if tools_dir.as_os_str().is_empty() {
            return Err(ToolchainError::InvalidArgument {
                detail: "tools directory path is empty".into(),
            });
        }
        if tools_dir.is_dir() {
            log::debug!("tools already present in {}", tools_dir.display());
            self.set_state(ToolchainState::Present);
            return Ok(ExtractionOutcome::AlreadyPresent);
        }
        if tools_dir.exists() {
            log::error!("{} exists but is not a directory", tools_dir.display());
            return Err(ToolchainError::InvalidArgument {
                detail: format!("{} exists but is not a directory", tools_dir.display()),
            });
        }
        if self.archives.is_empty() {
            return Err(ToolchainError::NoArchives { host: self.host });
        }

        fs::create_dir_all(tools_dir).map_err(|source| {
            log::error!("unable to create tool directory {}", tools_dir.display());
            ToolchainError::CreateDir {
                path: tools_dir.to_path_buf(),
                source,
            }
        })?;
        self.set_state(ToolchainState::Extracting);

        let mut files = 0;
        for (index, archive) in self.archives.iter().enumerate() {
            if cancel.load(Ordering::Acquire) {
                log::info!("tool extraction cancelled");
                self.discard(tools_dir);
                return Err(ToolchainError::Cancelled {
                    path: tools_dir.to_path_buf(),
                });
            }
            log::info!(
                "extracting {} ({} bytes) into {}",
                archive.label(),
                archive.len(),
                tools_dir.display()
            );
            match unpack(archive, tools_dir) {
                Ok(count) => {
                    files += count;
                    after_archive(index);
                }
                Err(detail) => {
                    log::error!("failed to extract tool binaries from {}: {detail}", archive.label());
                    self.discard(tools_dir);
                    return Err(ToolchainError::Extraction {
                        archive: archive.label().to_string(),
                        detail,
                    });
                }
            }
        }

        let permissions = if self.host.needs_permission_repair() {
            let report = repair_executable_permissions(
                &self.layout.executable_dirs(tools_dir),
                &self.layout.extra_executable_paths(tools_dir),
            );
            if !report.is_clean() {
                log::warn!(
                    "{} tool binaries could not be made executable",
                    report.failed.len() + report.missing_dirs.len()
                );
            }
            Some(report)
        } else {
            None
        };

        let manifest = ExtractionManifest {
            target_triple: self.layout.triple.clone(),
            toolchain_version: self.layout.version.clone(),
            host: self.host,
            archives: self.archives.iter().map(ArchiveRecord::from_archive).collect(),
            files,
        };
        if let Err(e) = manifest.write(tools_dir) {
            log::warn!("unable to write toolchain record: {e}");
        }

        self.set_state(ToolchainState::Present);
        log::info!("extracted {files} files from {} archive(s)", self.archives.len());
        Ok(ExtractionOutcome::Extracted(ExtractionSummary {
            archives: self.archives.len(),
            files,
            permissions,
        }))
    }

    fn discard(&self, tools_dir: &Path) {
        if let Err(e) = fs::remove_dir_all(tools_dir) {
            log::error!("unable to remove {}: {e}", tools_dir.display());
        }
        self.set_state(ToolchainState::Failed);
    }
}

/// Unpack one zip archive into `dest`, returning the number of files written.
fn unpack(archive: &ToolchainArchive, dest: &Path) -> std::result::Result<usize, String> {
    let mut zip =
        zip::ZipArchive::new(Cursor::new(archive.bytes())).map_err(|e| e.to_string())?;
    let mut files = 0;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| e.to_string())?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => return Err(format!("entry '{}' has an unsafe path", entry.name())),
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| format!("{}: {e}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("{}: {e}", parent.display()))?;
        }
        let mut out =
            fs::File::create(&out_path).map_err(|e| format!("{}: {e}", out_path.display()))?;
        io::copy(&mut entry, &mut out).map_err(|e| format!("{}: {e}", relative.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| format!("{}: {e}", out_path.display()))?;
        }
        files += 1;
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn layout() -> ToolchainLayout {
        ToolchainLayout::new("aarch64-none-elf", "12.2.1")
    }

    fn linux_bundle() -> ToolchainBundle {
        let bytes = zip_of(&[
            ("bin/aarch64-none-elf-gcc", b"gcc"),
            ("aarch64-none-elf/bin/as", b"as"),
            ("libexec/gcc/aarch64-none-elf/12.2.1/cc1", b"cc1"),
        ]);
        ToolchainBundle::new(
            vec![ToolchainArchive::owned("linuxTools", bytes)],
            layout(),
            HostOs::Linux,
        )
    }

    #[test]
    fn extracts_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = linux_bundle();
        assert_eq!(ToolchainState::detect(&tools), ToolchainState::NotPresent);

        let outcome = bundle.extract(&tools).unwrap();
        let ExtractionOutcome::Extracted(summary) = outcome else {
            panic!("expected extraction, got {outcome:?}");
        };
        assert_eq!(summary.archives, 1);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.permissions.unwrap().updated, 3);
        assert_eq!(fs::read(tools.join("bin/aarch64-none-elf-gcc")).unwrap(), b"gcc");
        assert_eq!(bundle.state(), ToolchainState::Present);
        assert_eq!(ToolchainState::detect(&tools), ToolchainState::Present);
    }

    #[test]
    fn second_call_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = linux_bundle();
        bundle.extract(&tools).unwrap();
        fs::write(tools.join("marker"), b"keep").unwrap();

        let outcome = bundle.extract(&tools).unwrap();
        assert_eq!(outcome, ExtractionOutcome::AlreadyPresent);
        assert_eq!(fs::read(tools.join("marker")).unwrap(), b"keep");
    }

    #[test]
    fn split_archives_all_applied() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = ToolchainBundle::new(
            vec![
                ToolchainArchive::owned("win64ToolsA", zip_of(&[("bin/gcc.exe", b"a")])),
                ToolchainArchive::owned("win64ToolsB", zip_of(&[("lib/libc.a", b"b")])),
            ],
            layout(),
            HostOs::Windows,
        );
        let ExtractionOutcome::Extracted(summary) = bundle.extract(&tools).unwrap() else {
            panic!("expected extraction");
        };
        assert_eq!(summary.archives, 2);
        assert_eq!(summary.files, 2);
        assert!(summary.permissions.is_none());
        assert!(tools.join("bin/gcc.exe").is_file());
        assert!(tools.join("lib/libc.a").is_file());
    }

    #[test]
    fn corrupt_archive_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = ToolchainBundle::new(
            vec![
                ToolchainArchive::owned("A", zip_of(&[("bin/gcc", b"gcc")])),
                ToolchainArchive::owned("B", b"definitely not a zip".to_vec()),
            ],
            layout(),
            HostOs::Linux,
        );
        let err = bundle.extract(&tools).unwrap_err();
        match err {
            ToolchainError::Extraction { archive, .. } => assert_eq!(archive, "B"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!tools.exists());
        assert_eq!(bundle.state(), ToolchainState::Failed);

        // A later attempt starts from scratch rather than reporting presence.
        let good = linux_bundle();
        assert!(matches!(
            good.extract(&tools).unwrap(),
            ExtractionOutcome::Extracted(_)
        ));
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = linux_bundle().extract(Path::new("")).unwrap_err();
        assert!(matches!(err, ToolchainError::InvalidArgument { .. }));
    }

    #[test]
    fn no_archives_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = ToolchainBundle::new(vec![], layout(), HostOs::Linux);
        let err = bundle.extract(&tools).unwrap_err();
        assert!(matches!(err, ToolchainError::NoArchives { host: HostOs::Linux }));
        assert!(!tools.exists());
    }

    #[test]
    fn cancelled_before_first_archive() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let cancel = AtomicBool::new(true);
        let err = linux_bundle()
            .extract_with_cancel(&tools, &cancel)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::Cancelled { .. }));
        assert!(!tools.exists());
    }

    #[test]
    fn cancelled_between_archives_removes_partial_tree() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = ToolchainBundle::new(
            vec![
                ToolchainArchive::owned("win64ToolsA", zip_of(&[("bin/gcc.exe", b"a")])),
                ToolchainArchive::owned("win64ToolsB", zip_of(&[("lib/libc.a", b"b")])),
                ToolchainArchive::owned("win64ToolsC", zip_of(&[("lib/libm.a", b"c")])),
            ],
            layout(),
            HostOs::Windows,
        );
        let cancel = AtomicBool::new(false);
        let mut unpacked = Vec::new();
        let err = bundle
            .extract_archives(&tools, &cancel, |index| {
                unpacked.push(index);
                assert!(tools.join("bin/gcc.exe").is_file());
                cancel.store(true, Ordering::Release);
            })
            .unwrap_err();

        assert!(matches!(err, ToolchainError::Cancelled { .. }));
        assert_eq!(unpacked, [0]);
        assert!(!tools.exists());
        assert_eq!(bundle.state(), ToolchainState::Failed);
        assert_eq!(ToolchainState::detect(&tools), ToolchainState::NotPresent);

        cancel.store(false, Ordering::Release);
        let ExtractionOutcome::Extracted(summary) = bundle.extract_with_cancel(&tools, &cancel).unwrap() else {
            panic!("expected a fresh extraction after cancellation");
        };
        assert_eq!(summary.archives, 3);
        assert_eq!(summary.files, 3);
        assert!(tools.join("lib/libm.a").is_file());
    }

    #[test]
    fn file_at_tools_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        fs::write(&tools, b"not a directory").unwrap();

        let err = linux_bundle().extract(&tools).unwrap_err();
        assert!(matches!(err, ToolchainError::InvalidArgument { .. }));
        assert!(tools.is_file());
        assert_eq!(ToolchainState::detect(&tools), ToolchainState::NotPresent);
    }

    #[test]
    fn record_written_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        let bundle = linux_bundle();
        bundle.extract(&tools).unwrap();
        assert!(tools.join(MANIFEST_FILE).is_file());
        let manifest = ExtractionManifest::read(&tools).unwrap().unwrap();
        assert_eq!(manifest.files, 3);
        assert!(manifest.matches(bundle.archives()));
    }

    #[cfg(unix)]
    #[test]
    fn binaries_become_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        linux_bundle().extract(&tools).unwrap();
        for path in [
            "bin/aarch64-none-elf-gcc",
            "aarch64-none-elf/bin/as",
            "libexec/gcc/aarch64-none-elf/12.2.1/cc1",
        ] {
            let mode = fs::metadata(tools.join(path)).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "{path} is not executable");
        }
    }
}
