//! Raspberry Pi 4B based STRIDE-MKII.

use std::fmt;

use stride_deploy::{DeviceProgrammer, TftpTransport, Transport};
use stride_scripts::linker::OUTPUT_SECTIONS;
use stride_scripts::{CpuProfile, ScriptEmitter};
use stride_targets::{require_valid, ConfigOverrides, HostOs, MemoryMap, PlatformConfig, TargetId};
use stride_toolchain::{ToolchainBundle, ToolchainLayout};

use crate::error::Result;
use crate::platform::Platform;
use crate::resources::PlatformResources;

/// Board type name used in resource file names and build scripts.
pub const MCU_TYPE_NAME: &str = "RPI4B";

pub struct Rpi4b {
    host: HostOs,
    config: PlatformConfig,
    resources: PlatformResources,
    toolchain: ToolchainBundle,
    programmer: DeviceProgrammer<Box<dyn Transport>>,
}

impl Rpi4b {
    /// Platform with the built-in configuration, programming over TFTP.
    pub fn new(host: HostOs, resources: PlatformResources) -> Result<Self> {
        Self::with_overrides(host, resources, &ConfigOverrides::default())
    }

    /// Platform with `overrides` merged over the built-in configuration.
    pub fn with_overrides(
        host: HostOs,
        resources: PlatformResources,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let config = overrides.apply(&Self::configure());
        require_valid(&config)?;
        if !overrides.is_empty() {
            log::debug!("applied configuration overrides for {}", TargetId::Rpi4b);
        }

        let layout = ToolchainLayout::for_host(
            config.toolchain_prefix.clone(),
            config.toolchain_version.clone(),
            host,
        );
        let toolchain = ToolchainBundle::new(resources.toolchain().to_vec(), layout, host);
        let transport: Box<dyn Transport> = Box::new(TftpTransport::new());
        let programmer = DeviceProgrammer::from_config(transport, &config);

        Ok(Self {
            host,
            config,
            resources,
            toolchain,
            programmer,
        })
    }

    /// Replace the image transport.
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.programmer = DeviceProgrammer::from_config(transport, &self.config);
        self
    }

    /// Archives compiled in from `$STRIDE_RESOURCE_DIR` at build time.
    #[cfg(feature = "embedded-resources")]
    pub fn embedded_resources() -> PlatformResources {
        use stride_toolchain::ToolchainArchive;

        macro_rules! resource {
            ($name:literal) => {
                include_bytes!(concat!(env!("STRIDE_RESOURCE_DIR"), "/", $name))
            };
        }

        #[cfg(target_os = "linux")]
        let toolchain = vec![ToolchainArchive::embedded("linuxTools", resource!("linuxTools.zip"))];
        #[cfg(target_os = "macos")]
        let toolchain = vec![ToolchainArchive::embedded("macosTools", resource!("macosTools.zip"))];
        #[cfg(target_os = "windows")]
        let toolchain = vec![
            ToolchainArchive::embedded("win64ToolsA", resource!("win64ToolsA.zip")),
            ToolchainArchive::embedded("win64ToolsB", resource!("win64ToolsB.zip")),
            ToolchainArchive::embedded("win64ToolsC", resource!("win64ToolsC.zip")),
            ToolchainArchive::embedded("win64ToolsD", resource!("win64ToolsD.zip")),
        ];
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        let toolchain = Vec::new();

        PlatformResources::from_static(
            resource!("includes_RPI4B.zip"),
            resource!("libs_RPI4B.zip"),
            toolchain,
        )
    }
}

impl fmt::Debug for Rpi4b {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rpi4b")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("resources", &self.resources)
            .field("transport", &self.programmer.transport().name())
            .finish()
    }
}

fn section_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Platform for Rpi4b {
    fn configure() -> PlatformConfig {
        // Single SDRAM region: everything the linker script places counts
        // against ram0, everything but .bss is in the image file.
        let memory_map = MemoryMap {
            ram0_sections: section_list(OUTPUT_SECTIONS),
            ram1_sections: Vec::new(),
            flash_sections: OUTPUT_SECTIONS
                .iter()
                .filter(|s| **s != ".bss")
                .map(|s| s.to_string())
                .collect(),
        };

        PlatformConfig {
            toolchain_prefix: "aarch64-none-elf".into(),
            toolchain_version: "12.2.1".into(),
            build_output_binary: "Avalon.img".into(),
            programming_file: "Avalon.img".into(),
            linker_filename: "linker.ld".into(),
            legacy_image_name: "kernel84.img".into(),

            base_cpu_load_percent: 2.0,
            base_ram0_load_percent: 0.1,
            base_ram1_load_percent: 0.1,
            base_audio_buffers: 6,

            program_flash_max_size: 32 * 1024 * 1024,
            program_ram_size: 512 * 1024 * 1024,
            program_ram0_safety_ratio: 0.90,
            program_ram1_safety_ratio: 0.98,
            cpu_safety_threshold: 95.0,
            common_safety_ratio: 0.90,

            product_name: "STRIDE-MKII".into(),
            mcu_type_name: MCU_TYPE_NAME.into(),
            board_revision: 2,
            core_version: semver::Version::new(1, 0, 0),
            audio_block_samples: 128,
            audio_sample_rate: 48_000,
            extra_include_libs: vec!["arm_math".into()],

            device_address: "192.168.1.27".into(),
            transfer_timeout_secs: 60,

            memory_map,
        }
    }

    fn id(&self) -> TargetId {
        TargetId::Rpi4b
    }

    fn host(&self) -> HostOs {
        self.host
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn resources(&self) -> &PlatformResources {
        &self.resources
    }

    fn toolchain(&self) -> &ToolchainBundle {
        &self.toolchain
    }

    fn emitter(&self) -> ScriptEmitter<'_> {
        ScriptEmitter::new(
            TargetId::Rpi4b.as_str(),
            &self.config,
            self.host,
            CpuProfile::CORTEX_A72,
        )
    }

    fn programmer(&self) -> &DeviceProgrammer<Box<dyn Transport>> {
        &self.programmer
    }
}
