//! Resource budget validation: does a measured image fit the target?

use std::fmt;

use stride_targets::PlatformConfig;

use crate::measure::MemoryFootprint;

/// Usage of one budgeted region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionUsage {
    /// Region name ("ram0", "ram1", "flash", "cpu").
    pub name: &'static str,
    /// Amount used (bytes, or percent for cpu).
    pub used: f64,
    /// Amount available in the same unit.
    pub capacity: f64,
    /// `used / capacity`.
    pub usage: f64,
    /// Usage must stay strictly below this fraction.
    pub ratio: f64,
}

impl RegionUsage {
    fn new(name: &'static str, used: f64, capacity: f64, ratio: f64) -> Self {
        let usage = if capacity > 0.0 { used / capacity } else { f64::INFINITY };
        Self {
            name,
            used,
            capacity,
            usage,
            ratio,
        }
    }

    fn bytes(name: &'static str, used: u64, capacity: u64, ratio: f64) -> Self {
        Self::new(name, used as f64, capacity as f64, ratio)
    }

    /// Reaching the ratio exactly counts as a failure.
    pub fn fits(&self) -> bool {
        self.usage < self.ratio
    }
}

impl fmt::Display for RegionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.0}/{:.0} ({:.2}%, limit {:.1}%)",
            self.name,
            self.used,
            self.capacity,
            self.usage * 100.0,
            self.ratio * 100.0
        )?;
        if !self.fits() {
            write!(f, " OVER BUDGET")?;
        }
        Ok(())
    }
}

/// RAM budget result.
#[derive(Debug, Clone, PartialEq)]
pub struct RamReport {
    pub ram0: RegionUsage,
    pub ram1: RegionUsage,
}

impl RamReport {
    pub fn fits(&self) -> bool {
        self.ram0.fits() && self.ram1.fits()
    }
}

impl fmt::Display for RamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.ram0)?;
        writeln!(f, "  {}", self.ram1)
    }
}

/// Flash / program image budget result.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashReport {
    pub flash: RegionUsage,
}

impl FlashReport {
    pub fn fits(&self) -> bool {
        self.flash.fits()
    }
}

impl fmt::Display for FlashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.flash)
    }
}

/// CPU budget result. Usage is the fraction of the 100% total.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuReport {
    pub cpu: RegionUsage,
}

impl CpuReport {
    pub fn fits(&self) -> bool {
        self.cpu.fits()
    }
}

impl fmt::Display for CpuReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.cpu)
    }
}

/// Check both RAM regions against `program_ram_size`.
pub fn check_ram(footprint: &MemoryFootprint, config: &PlatformConfig) -> RamReport {
    let report = RamReport {
        ram0: RegionUsage::bytes(
            "ram0",
            footprint.ram0,
            config.program_ram_size,
            config.program_ram0_safety_ratio,
        ),
        ram1: RegionUsage::bytes(
            "ram1",
            footprint.ram1,
            config.program_ram_size,
            config.program_ram1_safety_ratio,
        ),
    };
    log::info!("estimated {}", report.ram0);
    log::info!("estimated {}", report.ram1);
    report
}

/// Check the program image against `program_flash_max_size`.
pub fn check_flash(footprint: &MemoryFootprint, config: &PlatformConfig) -> FlashReport {
    let report = FlashReport {
        flash: RegionUsage::bytes(
            "flash",
            footprint.flash,
            config.program_flash_max_size,
            config.common_safety_ratio,
        ),
    };
    log::info!("estimated {}", report.flash);
    report
}

/// Check an estimated effect CPU load (percent) plus the platform's base load.
pub fn check_cpu(estimated_percent: f64, config: &PlatformConfig) -> CpuReport {
    let total = config.base_cpu_load_percent + estimated_percent;
    CpuReport {
        cpu: RegionUsage::new("cpu", total, 100.0, config.cpu_safety_threshold / 100.0),
    }
}
