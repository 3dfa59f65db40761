use serde::{Deserialize, Serialize};
use trash_tray_core::{FailurePolicy, ThemePreference};

/// Indicator appearance configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Which icon variant to show.
    #[serde(default)]
    pub theme: ThemePreference,
    /// What the indicator shows when the trash cannot be read.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}
