use crate::config::default_notify_on_empty;

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Whether to show a desktop notification after the trash is emptied.
    #[serde(default = "default_notify_on_empty")]
    pub notify_on_empty: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            notify_on_empty: default_notify_on_empty(),
        }
    }
}
