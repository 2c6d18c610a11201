//! Host-aware entry point for script emission.

use stride_targets::{BuildFlags, HostOs, PlatformConfig};

use crate::error::{Result, ScriptError};
use crate::library::library_makefile_inc;
use crate::linker::aarch64_linker_script;
use crate::makefile::{application_makefile, test_makefile, TestMakefileRequest};
use crate::profile::{CpuProfile, ScriptKind};

/// Emits the build scripts of one target for one host.
///
/// Borrowing the configuration keeps the emitter cheap to build per call and
/// makes it `Send + Sync` whenever the configuration is.
#[derive(Debug, Clone, Copy)]
pub struct ScriptEmitter<'a> {
    target: &'a str,
    config: &'a PlatformConfig,
    host: HostOs,
    profile: CpuProfile,
    quiet_recipes: bool,
}

impl<'a> ScriptEmitter<'a> {
    pub fn new(target: &'a str, config: &'a PlatformConfig, host: HostOs, profile: CpuProfile) -> Self {
        Self {
            target,
            config,
            host,
            profile,
            quiet_recipes: true,
        }
    }

    /// Echo recipe commands when running make (`TMOD` left empty).
    pub fn with_quiet_recipes(mut self, quiet: bool) -> Self {
        self.quiet_recipes = quiet;
        self
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    fn ensure_supported(&self, kind: ScriptKind) -> Result<()> {
        if kind.supported_on(self.host) {
            Ok(())
        } else {
            Err(ScriptError::UnsupportedTarget {
                target: self.target.to_string(),
                host: self.host,
                script: kind,
            })
        }
    }

    pub fn linker_script(&self) -> Result<String> {
        self.ensure_supported(ScriptKind::LinkerScript)?;
        Ok(aarch64_linker_script())
    }

    pub fn makefile(&self) -> Result<String> {
        self.ensure_supported(ScriptKind::Makefile)?;
        Ok(application_makefile(self.config, &self.profile))
    }

    pub fn test_makefile(&self, request: &TestMakefileRequest) -> Result<String> {
        self.ensure_supported(ScriptKind::TestMakefile)?;
        test_makefile(self.config, &self.profile, request)
    }

    pub fn library_makefile_inc(&self, flags: &BuildFlags, cpp_flags: &str) -> Result<String> {
        self.ensure_supported(ScriptKind::LibraryMakefileInc)?;
        Ok(library_makefile_inc(
            self.config,
            &self.profile,
            flags,
            cpp_flags,
            self.quiet_recipes,
        ))
    }
}
