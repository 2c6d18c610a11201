//! Linker script for bare-metal AArch64 images.

/// Section layout: `.init` first so it lands on the load address, then code,
/// read-only data, constructors, unwind tables, data and zero-initialised data.
const LINKER_SCRIPT: &str = concat!(
    "ENTRY(_start)\n",
    "\n",
    "SECTIONS\n",
    "{\n",
    "\t.init : {\n",
    "\t\t*(.init)\n",
    "\t}\n",
    "\n",
    "\t.text : {\n",
    "\t\t*(.text*)\n",
    "\n",
    "\t\t_etext = .;\n",
    "\t}\n",
    "\n",
    "\t.rodata : {\n",
    "\t\t*(.rodata*)\n",
    "\t}\n",
    "\n",
    "\t.init_array : {\n",
    "\t\t__init_start = .;\n",
    "\n",
    "\t\tKEEP(*(.init_array*))\n",
    "\n",
    "\t\t__init_end = .;\n",
    "\t}\n",
    "\n",
    "\t.ARM.exidx : {\n",
    "\t\t__exidx_start = .;\n",
    "\n",
    "\t\t*(.ARM.exidx*)\n",
    "\n",
    "\t\t__exidx_end = .;\n",
    "\t}\n",
    "\n",
    "\t.eh_frame : {\n",
    "\t\t*(.eh_frame*)\n",
    "\t}\n",
    "\n",
    "\t.data : {\n",
    "\t\t*(.data*)\n",
    "\t}\n",
    "\n",
    "\t.bss : {\n",
    "\t\t__bss_start = .;\n",
    "\n",
    "\t\t*(.bss*)\n",
    "\t\t*(COMMON)\n",
    "\n",
    "\t\t_end = .;\n",
    "\t\tend = .;\n",
    "\t}\n",
    "}\n",
);

/// Output sections in the order the script places them.
pub const OUTPUT_SECTIONS: &[&str] = &[
    ".init",
    ".text",
    ".rodata",
    ".init_array",
    ".ARM.exidx",
    ".eh_frame",
    ".data",
    ".bss",
];

/// The linker script text.
pub fn aarch64_linker_script() -> String {
    LINKER_SCRIPT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_entry_point() {
        assert!(aarch64_linker_script().starts_with("ENTRY(_start)\n"));
    }

    #[test]
    fn sections_in_order() {
        let script = aarch64_linker_script();
        let mut last = 0;
        for section in OUTPUT_SECTIONS {
            let needle = format!("\t{section} : {{");
            let pos = script.find(&needle).unwrap_or_else(|| panic!("{section} missing"));
            assert!(pos >= last, "{section} out of order");
            last = pos;
        }
    }

    #[test]
    fn exports_runtime_symbols() {
        let script = aarch64_linker_script();
        for symbol in ["_etext", "__init_start", "__init_end", "__exidx_start", "__exidx_end", "__bss_start", "_end"] {
            assert!(script.contains(&format!("{symbol} = .;")), "{symbol} missing");
        }
        assert!(script.contains("KEEP(*(.init_array*))"));
        assert!(script.contains("*(COMMON)"));
    }
}
