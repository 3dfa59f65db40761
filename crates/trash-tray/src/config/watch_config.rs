use crate::config::{default_debounce_ms, default_min_interval_ms};

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use trash_tray_core::CoalescerConfig;

/// Change watch and debounce configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to watch instead of the platform trash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash_path: Option<PathBuf>,
    /// Quiet period after the last change before re-checking.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Minimum spacing between two re-checks.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Re-check immediately on the first change of a burst.
    #[serde(default)]
    pub leading_edge: bool,
}

impl WatchConfig {
    /// Coalescer timings for the monitor.
    pub fn coalescer(&self) -> CoalescerConfig {
        CoalescerConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            min_interval: Duration::from_millis(self.min_interval_ms),
            leading_edge: self.leading_edge,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            trash_path: None,
            debounce_ms: default_debounce_ms(),
            min_interval_ms: default_min_interval_ms(),
            leading_edge: false,
        }
    }
}
