use stride_targets::{MemoryMap, PlatformConfig};

pub(crate) fn rpi4_config() -> PlatformConfig {
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
        program_flash_max_size: 33_554_432,
        program_ram_size: 536_870_912,
        program_ram0_safety_ratio: 0.9,
        program_ram1_safety_ratio: 0.98,
        cpu_safety_threshold: 95.0,
        common_safety_ratio: 0.9,
        product_name: "STRIDE-MKII".into(),
        mcu_type_name: "RPI4B".into(),
        board_revision: 2,
        core_version: semver::Version::new(1, 4, 2),
        audio_block_samples: 128,
        audio_sample_rate: 48_000,
        extra_include_libs: vec!["arm_math".into()],
        device_address: "192.168.1.27".into(),
        transfer_timeout_secs: 60,
        memory_map: MemoryMap {
            ram0_sections: [".init", ".text", ".rodata", ".init_array", ".ARM.exidx", ".eh_frame", ".data", ".bss"]
                .map(String::from)
                .to_vec(),
            ram1_sections: vec![".bss.dma".into()],
            flash_sections: [".init", ".text", ".rodata", ".init_array", ".ARM.exidx", ".eh_frame", ".data"]
                .map(String::from)
                .to_vec(),
        },
    }
}
