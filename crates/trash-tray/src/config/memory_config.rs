use crate::config::{
    default_check_interval_secs, default_critical_threshold_mb, default_memory_enabled,
    default_monitor_interval_secs, default_pressure_threshold_mb,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use trash_tray_core::StewardConfig;

const MIB: u64 = 1024 * 1024;

/// Memory steward configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Whether the steward runs at all.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,
    /// Period of the pressure check.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Period of the critical-threshold monitor.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    /// Resident size that triggers a standard trim.
    #[serde(default = "default_pressure_threshold_mb")]
    pub pressure_threshold_mb: u64,
    /// Resident size that triggers an aggressive trim.
    #[serde(default = "default_critical_threshold_mb")]
    pub critical_threshold_mb: u64,
}

impl MemoryConfig {
    /// Steward timings and thresholds.
    pub fn steward(&self) -> StewardConfig {
        StewardConfig {
            check_interval: Duration::from_secs(self.check_interval_secs),
            monitor_interval: Duration::from_secs(self.monitor_interval_secs),
            pressure_threshold: self.pressure_threshold_mb.saturating_mul(MIB),
            critical_threshold: self.critical_threshold_mb.saturating_mul(MIB),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            check_interval_secs: default_check_interval_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            pressure_threshold_mb: default_pressure_threshold_mb(),
            critical_threshold_mb: default_critical_threshold_mb(),
        }
    }
}
