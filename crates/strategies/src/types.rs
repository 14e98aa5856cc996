// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)] // Copy is handy for the optimizer
pub struct MACrossoverSettings {
    /// Length of the fast rolling mean, in bars.
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    /// Length of the slow rolling mean, in bars. Must exceed `short_window`.
    #[serde(default = "default_mid_window")]
    pub mid_window: usize,
}

impl Default for MACrossoverSettings {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            mid_window: default_mid_window(),
        }
    }
}

fn default_short_window() -> usize { 7 }
fn default_mid_window() -> usize { 20 }
