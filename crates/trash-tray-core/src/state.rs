use std::io;

use serde::{Deserialize, Serialize};

/// Snapshot of the trash container.
///
/// Immutable once produced; the synchronizer replaces the whole value when a
/// newer snapshot arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrashState {
    /// Whether the trash holds no items.
    pub is_empty: bool,
    /// Total size of all trashed items in bytes.
    pub byte_size: u64,
    /// Number of top-level trashed items.
    pub item_count: u64,
}

impl TrashState {
    /// An empty trash with no recorded size.
    pub const EMPTY: Self = Self {
        is_empty: true,
        byte_size: 0,
        item_count: 0,
    };

    /// Build a snapshot from enumeration totals.
    pub fn from_stats(stats: TrashStats) -> Self {
        Self {
            is_empty: stats.item_count == 0,
            byte_size: stats.total_bytes,
            item_count: stats.item_count,
        }
    }

    /// Snapshot for a quick emptiness check, which carries no size data.
    pub fn from_emptiness(is_empty: bool) -> Self {
        Self {
            is_empty,
            ..Self::EMPTY
        }
    }
}

/// Totals produced by a full enumeration of the trash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrashStats {
    /// Number of top-level trashed items.
    pub item_count: u64,
    /// Sum of file sizes below the trash root.
    pub total_bytes: u64,
}

/// Why a probe could not produce an authoritative answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// The process may not read the trash directory.
    AccessDenied,
    /// Any other I/O failure while opening the trash root.
    Io(io::ErrorKind),
}

impl From<&io::Error> for DegradeReason {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => DegradeReason::AccessDenied,
            kind => DegradeReason::Io(kind),
        }
    }
}

/// Result of a background probe. Never an error: failures are explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<T> {
    /// The probe observed the trash.
    Ok(T),
    /// The probe failed; the caller decides what to assume via [`FailurePolicy`].
    Degraded(DegradeReason),
    /// Shutdown was requested while the probe was running.
    Cancelled,
}

/// What a degraded probe result should mean for the held state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the last known state; the indicator does not change.
    #[default]
    KeepLast,
    /// Treat the trash as empty, so a stuck "full" icon can never appear.
    AssumeEmpty,
}

impl FailurePolicy {
    /// State to adopt after a degraded probe. `None` leaves the held state alone.
    pub fn on_degraded(self) -> Option<TrashState> {
        match self {
            FailurePolicy::KeepLast => None,
            FailurePolicy::AssumeEmpty => Some(TrashState::EMPTY),
        }
    }
}
