mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod indicator_config;
mod memory_config;
mod watch_config;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, indicator_config::IndicatorConfig,
    memory_config::MemoryConfig, watch_config::WatchConfig,
};

pub(crate) const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub(crate) const DEFAULT_MIN_INTERVAL_MS: u64 = 250;
pub(crate) const DEFAULT_MEMORY_ENABLED: bool = true;
pub(crate) const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub(crate) const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 60;
pub(crate) const DEFAULT_PRESSURE_THRESHOLD_MB: u64 = 64;
pub(crate) const DEFAULT_CRITICAL_THRESHOLD_MB: u64 = 128;
pub(crate) const DEFAULT_NOTIFY_ON_EMPTY: bool = true;

pub(crate) fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

pub(crate) fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}

pub(crate) fn default_memory_enabled() -> bool {
    DEFAULT_MEMORY_ENABLED
}

pub(crate) fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

pub(crate) fn default_monitor_interval_secs() -> u64 {
    DEFAULT_MONITOR_INTERVAL_SECS
}

pub(crate) fn default_pressure_threshold_mb() -> u64 {
    DEFAULT_PRESSURE_THRESHOLD_MB
}

pub(crate) fn default_critical_threshold_mb() -> u64 {
    DEFAULT_CRITICAL_THRESHOLD_MB
}

pub(crate) fn default_notify_on_empty() -> bool {
    DEFAULT_NOTIFY_ON_EMPTY
}
