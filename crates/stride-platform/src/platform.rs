//! The capability interface every hardware target implements.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use stride_deploy::{
    check_cpu, check_flash, check_ram, measure_sections, CpuReport, DeviceProgrammer, FlashReport,
    MemoryFootprint, ProgrammingSession, RamReport, Transport,
};
use stride_scripts::{ScriptEmitter, TestMakefileRequest};
use stride_targets::{BuildFlags, HostOs, PlatformConfig, TargetId};
use stride_toolchain::{ExtractionOutcome, ToolchainBundle};

use crate::error::Result;
use crate::resources::PlatformResources;

/// A hardware target: its constants, archives, build scripts, budget checks
/// and device programming.
///
/// Implementors supply the target-specific parts (the accessors without a
/// default body); everything else is derived from them. The trait is object
/// safe so a front end can hold a `Box<dyn Platform>` chosen at startup.
pub trait Platform: Send + Sync {
    /// The target's built-in configuration, before any overrides.
    fn configure() -> PlatformConfig
    where
        Self: Sized;

    fn id(&self) -> TargetId;

    /// Host the platform was built for.
    fn host(&self) -> HostOs;

    /// Effective configuration (built-in constants plus overrides).
    fn config(&self) -> &PlatformConfig;

    fn resources(&self) -> &PlatformResources;

    fn toolchain(&self) -> &ToolchainBundle;

    /// Script emitter for this target and host.
    fn emitter(&self) -> ScriptEmitter<'_>;

    fn programmer(&self) -> &DeviceProgrammer<Box<dyn Transport>>;

    /// Compressed core headers. `len()` is the archive size.
    fn core_includes_zip(&self) -> &[u8] {
        self.resources().core_includes()
    }

    /// Compressed prebuilt core libraries.
    fn core_libs_zip(&self) -> &[u8] {
        self.resources().core_libs()
    }

    /// Unpack the host's toolchain into `tools_dir` unless it already exists.
    fn unzip_build_tools(&self, tools_dir: &Path) -> Result<ExtractionOutcome> {
        Ok(self.toolchain().extract(tools_dir)?)
    }

    /// Like [`unzip_build_tools`](Self::unzip_build_tools), stopping between
    /// archives once `cancel` is set.
    fn unzip_build_tools_with_cancel(
        &self,
        tools_dir: &Path,
        cancel: &AtomicBool,
    ) -> Result<ExtractionOutcome> {
        Ok(self.toolchain().extract_with_cancel(tools_dir, cancel)?)
    }

    fn linker_file(&self) -> Result<String> {
        Ok(self.emitter().linker_script()?)
    }

    fn makefile(&self) -> Result<String> {
        Ok(self.emitter().makefile()?)
    }

    fn test_makefile(&self, request: &TestMakefileRequest) -> Result<String> {
        Ok(self.emitter().test_makefile(request)?)
    }

    /// `makefile.inc` for effect library builds.
    fn library_makefile_inc(&self, flags: &BuildFlags, cpp_flags: &str) -> Result<String> {
        Ok(self.emitter().library_makefile_inc(flags, cpp_flags)?)
    }

    /// Libraries linked after the core, in link order.
    fn extra_include_libs(&self) -> &[String] {
        &self.config().extra_include_libs
    }

    fn flash_max_size(&self) -> u64 {
        self.config().program_flash_max_size
    }

    /// Section sizes of the linked image folded into budgeted regions.
    fn measure_image(&self, image: &Path) -> Result<MemoryFootprint> {
        let sizes = measure_sections(image)?;
        Ok(MemoryFootprint::from_sections(&sizes, &self.config().memory_map))
    }

    fn check_program_ram(&self, image: &Path) -> Result<RamReport> {
        let report = check_ram(&self.measure_image(image)?, self.config());
        if !report.fits() {
            log::error!("{} exceeds the RAM budget of {}", image.display(), self.id());
        }
        Ok(report)
    }

    fn check_program_flash(&self, image: &Path) -> Result<FlashReport> {
        let report = check_flash(&self.measure_image(image)?, self.config());
        if !report.fits() {
            log::error!("{} exceeds the flash budget of {}", image.display(), self.id());
        }
        Ok(report)
    }

    /// CPU budget for an estimated effect load in percent.
    fn check_cpu_load(&self, estimated_percent: f64) -> CpuReport {
        check_cpu(estimated_percent, self.config())
    }

    fn load_binary_file(&self, session: &mut ProgrammingSession, path: &Path) -> Result<u64> {
        Ok(self.programmer().load_binary_file(session, path)?)
    }

    fn open_usb(&self, session: &ProgrammingSession) -> Result<()> {
        Ok(self.programmer().open_usb(session)?)
    }

    /// Push the loaded image to the device. Blocks until the transfer ends.
    fn program_device(&self, session: &mut ProgrammingSession) -> Result<()> {
        Ok(self.programmer().program_device(session)?)
    }

    fn request_program_thread_exit(&self, session: &ProgrammingSession) {
        session.request_exit();
    }

    fn programming_progress(&self, session: &ProgrammingSession) -> f32 {
        session.progress()
    }

    fn is_erase_done(&self, _session: &ProgrammingSession) -> bool {
        self.programmer().is_erase_done()
    }
}
