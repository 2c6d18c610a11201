//! Hardware targets of the Stride firmware tool.
//!
//! Every target implements [`Platform`], which composes the lower crates:
//! - **Toolchain:** unpacking the host's compiler bundle ([`stride_toolchain`])
//! - **Scripts:** linker script and Makefile text ([`stride_scripts`])
//! - **Deployment:** budget checks and device programming ([`stride_deploy`])
//!
//! A platform is chosen once at startup with [`select_platform`].

pub mod error;
pub mod platform;
pub mod resources;
pub mod rpi4b;
pub mod select;

pub use error::{ErrorKind, PlatformError, Result};
pub use platform::Platform;
pub use resources::PlatformResources;
pub use rpi4b::Rpi4b;
pub use select::{builtin_config, load_overrides_for, overrides_path, select_platform};

#[cfg(feature = "embedded-resources")]
pub use select::embedded_resources;

pub use stride_deploy::{
    CpuReport, DeployError, FlashReport, MemoryFootprint, ProgrammerState, ProgrammingSession,
    RamReport, SessionMonitor, TftpTransport, TransferOutput, TransferRequest, Transport,
};
pub use stride_scripts::TestMakefileRequest;
pub use stride_targets::{BuildFlags, ConfigOverrides, HostOs, PlatformConfig, TargetId};
pub use stride_toolchain::ExtractionOutcome;
