//! Directory layout of an extracted GCC cross toolchain.

use std::path::{Path, PathBuf};

use stride_targets::HostOs;

/// Where the executables of an extracted toolchain live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainLayout {
    /// Target triple (e.g. "aarch64-none-elf").
    pub triple: String,
    /// GCC version (e.g. "12.2.1").
    pub version: String,
    /// Files at the toolchain root that also need the executable bit.
    pub extra_executables: Vec<PathBuf>,
}

impl ToolchainLayout {
    pub fn new(triple: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            triple: triple.into(),
            version: version.into(),
            extra_executables: Vec::new(),
        }
    }

    /// Layout for a given host. The macOS bundle carries its own GNU make.
    pub fn for_host(triple: impl Into<String>, version: impl Into<String>, host: HostOs) -> Self {
        let mut layout = Self::new(triple, version);
        if host == HostOs::MacOs {
            layout.extra_executables.push(PathBuf::from("gmake"));
        }
        layout
    }

    /// Directories whose files must be executable:
    /// `bin`, `<triple>/bin` and `libexec/gcc/<triple>/<version>`.
    pub fn executable_dirs(&self, root: &Path) -> Vec<PathBuf> {
        vec![
            root.join("bin"),
            root.join(&self.triple).join("bin"),
            root.join("libexec")
                .join("gcc")
                .join(&self.triple)
                .join(&self.version),
        ]
    }

    /// Absolute paths of the extra executables under `root`.
    pub fn extra_executable_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.extra_executables.iter().map(|p| root.join(p)).collect()
    }

    /// Path of a prefixed tool, e.g. `bin/aarch64-none-elf-objdump`.
    pub fn tool_path(&self, root: &Path, tool: &str) -> PathBuf {
        let name = format!("{}-{}{}", self.triple, tool, std::env::consts::EXE_SUFFIX);
        root.join("bin").join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_dirs_for_aarch64() {
        let layout = ToolchainLayout::new("aarch64-none-elf", "12.2.1");
        let dirs = layout.executable_dirs(Path::new("/tools"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/tools/bin"),
                PathBuf::from("/tools/aarch64-none-elf/bin"),
                PathBuf::from("/tools/libexec/gcc/aarch64-none-elf/12.2.1"),
            ]
        );
    }

    #[test]
    fn macos_adds_gmake() {
        let layout = ToolchainLayout::for_host("aarch64-none-elf", "12.2.1", HostOs::MacOs);
        assert_eq!(
            layout.extra_executable_paths(Path::new("/t")),
            vec![PathBuf::from("/t/gmake")]
        );
        let layout = ToolchainLayout::for_host("aarch64-none-elf", "12.2.1", HostOs::Linux);
        assert!(layout.extra_executables.is_empty());
    }

    #[test]
    fn tool_path_is_prefixed() {
        let layout = ToolchainLayout::new("aarch64-none-elf", "12.2.1");
        let path = layout.tool_path(Path::new("/t"), "objdump");
        assert!(path
            .to_string_lossy()
            .contains("aarch64-none-elf-objdump"));
    }
}
