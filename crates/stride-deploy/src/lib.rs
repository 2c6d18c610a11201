//! Image validation and deployment for Stride firmware targets.
//!
//! Two independent halves:
//! - **Budget validation:** measure the sections of a linked ELF image
//!   ([`measure`]) and compare the resulting footprint with the target's
//!   limits ([`budget`]).
//! - **Programming:** move a built image onto hardware through a
//!   [`Transport`], tracking progress in a caller-owned [`ProgrammingSession`].

pub mod budget;
pub mod error;
pub mod measure;
pub mod programmer;
pub mod session;
pub mod transport;

pub use budget::{check_cpu, check_flash, check_ram, CpuReport, FlashReport, RamReport, RegionUsage};
pub use error::{DeployError, Result};
pub use measure::{measure_sections, measure_sections_bytes, MemoryFootprint, SectionSizes};
pub use programmer::DeviceProgrammer;
pub use session::{ProgrammerState, ProgrammingSession, SessionMonitor, UNKNOWN_SIZE};
pub use transport::{TftpTransport, TransferOutput, TransferRequest, Transport};

#[cfg(test)]
mod testing;
