//! Per-invocation build switches.

use serde::{Deserialize, Serialize};

/// Switches applied when emitting a library makefile.
///
/// Each flag toggles one fixed fragment of the generated text. The only
/// interaction is the optimisation level: `enable_o3` selects `-O3`, otherwise
/// `-O2` is emitted, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildFlags {
    /// Use the debug flag set instead of the release flag set.
    pub is_debug: bool,
    /// Release builds use `-O3` instead of `-O2`.
    pub enable_o3: bool,
    /// Append `-ffast-math` to the release flags.
    pub enable_fast_math: bool,
    /// Compile out effect printf support.
    pub no_printf: bool,
}

impl BuildFlags {
    /// The optimisation token appended to release flags.
    pub fn optimization_token(&self) -> &'static str {
        if self.enable_o3 {
            "-O3"
        } else {
            "-O2"
        }
    }
}
