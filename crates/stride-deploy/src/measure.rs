//! Section size measurement of linked images.
//!
//! Sizes come straight from the ELF section headers; `.bss`-style sections
//! report their memory size even though they occupy nothing in the file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use object::{Object, ObjectSection};
use stride_targets::MemoryMap;

use crate::error::{DeployError, Result};

/// Size in bytes of every named section of an image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSizes {
    sizes: BTreeMap<String, u64>,
}

impl SectionSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a section. Repeated names accumulate.
    pub fn insert(&mut self, name: impl Into<String>, size: u64) {
        *self.sizes.entry(name.into()).or_insert(0) += size;
    }

    /// Size of `name`, 0 if the image has no such section.
    pub fn get(&self, name: &str) -> u64 {
        self.sizes.get(name).copied().unwrap_or(0)
    }

    /// Sum of the named sections.
    pub fn total_of<S: AsRef<str>>(&self, names: &[S]) -> u64 {
        names.iter().map(|n| self.get(n.as_ref())).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.sizes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl FromIterator<(String, u64)> for SectionSizes {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut sizes = SectionSizes::new();
        for (name, size) in iter {
            sizes.insert(name, size);
        }
        sizes
    }
}

/// Bytes attributed to each budgeted region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryFootprint {
    pub ram0: u64,
    pub ram1: u64,
    pub flash: u64,
}

impl MemoryFootprint {
    /// Fold measured sections into regions according to `map`.
    pub fn from_sections(sizes: &SectionSizes, map: &MemoryMap) -> Self {
        Self {
            ram0: sizes.total_of(&map.ram0_sections),
            ram1: sizes.total_of(&map.ram1_sections),
            flash: sizes.total_of(&map.flash_sections),
        }
    }
}

impl fmt::Display for MemoryFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ram0: {:#010x}  ram1: {:#010x}  flash: {:#010x}",
            self.ram0, self.ram1, self.flash
        )
    }
}

/// Read the section headers of the image at `path`.
pub fn measure_sections(path: &Path) -> Result<SectionSizes> {
    let data = std::fs::read(path).map_err(|source| DeployError::ImageIo {
        path: path.to_path_buf(),
        source,
    })?;
    measure_sections_bytes(&data).map_err(|detail| DeployError::Measurement {
        path: path.to_path_buf(),
        detail,
    })
}

/// Read the section headers of an in-memory image.
pub fn measure_sections_bytes(data: &[u8]) -> std::result::Result<SectionSizes, String> {
    let file = object::File::parse(data).map_err(|e| e.to_string())?;
    let mut sizes = SectionSizes::new();
    for section in file.sections() {
        let name = match section.name() {
            Ok(name) if !name.is_empty() => name,
            _ => continue,
        };
        sizes.insert(name, section.size());
    }
    log::debug!(
        "measured sections: {}",
        sizes
            .iter()
            .map(|(name, size)| format!("{name}:{size:#x}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object::write;
    use object::{Architecture, BinaryFormat, Endianness, SectionKind};

    /// Build a small AArch64 ELF object with the given initialised sections
    /// and one `.bss` of `bss` bytes.
    fn elf_with(sections: &[(&str, usize)], bss: u64) -> Vec<u8> {
        let mut obj = write::Object::new(BinaryFormat::Elf, Architecture::Aarch64, Endianness::Little);
        for (name, size) in sections {
            let kind = if name.starts_with(".text") || name.starts_with(".init") {
                SectionKind::Text
            } else if name.starts_with(".rodata") {
                SectionKind::ReadOnlyData
            } else {
                SectionKind::Data
            };
            let id = obj.add_section(Vec::new(), name.as_bytes().to_vec(), kind);
            obj.append_section_data(id, &vec![0xAA; *size], 4);
        }
        if bss > 0 {
            let id = obj.add_section(Vec::new(), b".bss".to_vec(), SectionKind::UninitializedData);
            obj.append_section_bss(id, bss, 8);
        }
        obj.write().unwrap()
    }

    fn map() -> MemoryMap {
        MemoryMap {
            ram0_sections: vec![".text".into(), ".data".into(), ".bss".into()],
            ram1_sections: vec![".bss.dma".into()],
            flash_sections: vec![".text".into(), ".data".into()],
        }
    }

    #[test]
    fn reads_sizes_from_elf() {
        let elf = elf_with(&[(".text", 0x400), (".data", 0x40)], 0x1000);
        let sizes = measure_sections_bytes(&elf).unwrap();
        assert_eq!(sizes.get(".text"), 0x400);
        assert_eq!(sizes.get(".data"), 0x40);
        assert_eq!(sizes.get(".bss"), 0x1000);
        assert_eq!(sizes.get(".bss.dma"), 0);
    }

    #[test]
    fn footprint_folds_through_map() {
        let elf = elf_with(&[(".text", 0x400), (".data", 0x40), (".bss.dma", 0x20)], 0x1000);
        let sizes = measure_sections_bytes(&elf).unwrap();
        let footprint = MemoryFootprint::from_sections(&sizes, &map());
        assert_eq!(footprint.ram0, 0x400 + 0x40 + 0x1000);
        assert_eq!(footprint.ram1, 0x20);
        assert_eq!(footprint.flash, 0x440);
    }

    #[test]
    fn measure_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Avalon.elf");
        std::fs::write(&path, elf_with(&[(".text", 16)], 0)).unwrap();
        assert_eq!(measure_sections(&path).unwrap().get(".text"), 16);
    }

    #[test]
    fn missing_image_is_io_error() {
        let err = measure_sections(Path::new("/nonexistent/Avalon.elf")).unwrap_err();
        assert!(matches!(err, DeployError::ImageIo { .. }));
    }

    #[test]
    fn garbage_is_measurement_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Avalon.img");
        std::fs::write(&path, b"raw binary, no headers").unwrap();
        let err = measure_sections(&path).unwrap_err();
        assert!(matches!(err, DeployError::Measurement { .. }));
    }

    #[test]
    fn repeated_names_accumulate() {
        let sizes: SectionSizes = vec![(".text".to_string(), 4), (".text".to_string(), 6)]
            .into_iter()
            .collect();
        assert_eq!(sizes.get(".text"), 10);
    }
}
