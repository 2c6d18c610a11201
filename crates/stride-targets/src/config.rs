//! Platform configuration model.
//!
//! A [`PlatformConfig`] is produced once per platform instance and never
//! mutated afterwards. Everything downstream (script emission, budget checks,
//! device programming) reads from it.

use serde::{Deserialize, Serialize};

/// Assignment of linked ELF sections to the memory regions that are budgeted.
///
/// Sections are matched by exact name. A section may count towards more than
/// one region (an image loaded into RAM occupies both the image budget and RAM).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryMap {
    /// Sections counted against RAM region 0.
    pub ram0_sections: Vec<String>,
    /// Sections counted against RAM region 1 (DMA memory on targets that have it).
    pub ram1_sections: Vec<String>,
    /// Sections counted against the program image / flash budget.
    pub flash_sections: Vec<String>,
}

/// Toolchain identity, artifact names and resource limits of one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformConfig {
    /// Cross-compiler prefix without the trailing dash (e.g. "aarch64-none-elf").
    pub toolchain_prefix: String,
    /// Cross-compiler version (e.g. "12.2.1").
    pub toolchain_version: String,
    /// Name of the build output image.
    pub build_output_binary: String,
    /// Name of the file handed to the programmer.
    pub programming_file: String,
    /// Name of the generated linker script.
    pub linker_filename: String,
    /// Fixed file name the deployment transport expects on the device side.
    pub legacy_image_name: String,

    /// CPU load present before user code runs, in percent.
    pub base_cpu_load_percent: f64,
    /// RAM0 load present before user code runs, in percent.
    pub base_ram0_load_percent: f64,
    /// RAM1 load present before user code runs, in percent.
    pub base_ram1_load_percent: f64,
    /// Audio buffers allocated by the runtime.
    pub base_audio_buffers: u32,

    /// Maximum program image size in bytes.
    pub program_flash_max_size: u64,
    /// RAM capacity in bytes.
    pub program_ram_size: u64,
    /// RAM0 usage must stay below this fraction.
    pub program_ram0_safety_ratio: f64,
    /// RAM1 usage must stay below this fraction.
    pub program_ram1_safety_ratio: f64,
    /// Estimated CPU load must stay below this percentage.
    pub cpu_safety_threshold: f64,
    /// General purpose ceiling (applied to the program image).
    pub common_safety_ratio: f64,

    /// Product name written into generated build scripts.
    pub product_name: String,
    /// MCU / board type name.
    pub mcu_type_name: String,
    /// Hardware revision exported to generated makefiles.
    pub board_revision: u32,
    /// Version of the prebuilt core library linked into test applications.
    pub core_version: semver::Version,
    /// Audio block size baked into compiler defines.
    pub audio_block_samples: u32,
    /// Audio sample rate baked into compiler defines, in Hz.
    pub audio_sample_rate: u32,
    /// Libraries linked in addition to the core, in link order.
    pub extra_include_libs: Vec<String>,

    /// Network address of the device for image transfer.
    pub device_address: String,
    /// Upper bound for one transfer, in seconds.
    pub transfer_timeout_secs: u64,

    /// Section-to-region assignment used by the budget validator.
    pub memory_map: MemoryMap,
}

impl PlatformConfig {
    /// Full tool prefix as used in makefiles (`<prefix>-`).
    pub fn tool_prefix(&self) -> String {
        format!("{}-", self.toolchain_prefix)
    }

    /// File name of the prebuilt core library (`core.<major>.<minor>.<patch>.dat`).
    pub fn core_library_filename(&self) -> String {
        let v = &self.core_version;
        format!("core.{}.{}.{}.dat", v.major, v.minor, v.patch)
    }
}

#[cfg(test)]
pub(crate) fn sample_config() -> PlatformConfig {
    PlatformConfig {
        toolchain_prefix: "arm-none-eabi".into(),
        toolchain_version: "10.3.1".into(),
        build_output_binary: "app.hex".into(),
        programming_file: "app.hex".into(),
        linker_filename: "app.ld".into(),
        legacy_image_name: "app.bin".into(),
        base_cpu_load_percent: 1.0,
        base_ram0_load_percent: 0.0,
        base_ram1_load_percent: 0.0,
        base_audio_buffers: 4,
        program_flash_max_size: 2 * 1024 * 1024,
        program_ram_size: 512 * 1024,
        program_ram0_safety_ratio: 0.9,
        program_ram1_safety_ratio: 0.9,
        cpu_safety_threshold: 90.0,
        common_safety_ratio: 0.9,
        product_name: "TEST".into(),
        mcu_type_name: "MCU".into(),
        board_revision: 1,
        core_version: semver::Version::new(3, 14, 15),
        audio_block_samples: 128,
        audio_sample_rate: 44_100,
        extra_include_libs: vec![],
        device_address: "10.0.0.2".into(),
        transfer_timeout_secs: 30,
        memory_map: MemoryMap::default(),
    }
}
