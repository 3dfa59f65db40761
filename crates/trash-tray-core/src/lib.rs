//! Trash-tray Core Library
//!
//! Keeps a two-state (empty/full) trash indicator in sync with the desktop
//! trash: a filesystem watch feeds a debounce coalescer, which schedules
//! single-flight probes on blocking threads; the synchronizer swaps the
//! cached indicator image only when emptiness actually flips.
//!
//! # Example
//!
//! ```no_run
//! use trash_tray_core::{
//!     IconCache, MonitorConfig, SystemThemeDetector, ThemePreference, TrashLocation,
//!     TrashMonitor,
//! };
//!
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let Some(location) = TrashLocation::resolve(None) else {
//!         return;
//!     };
//!     let monitor = TrashMonitor::start_system(
//!         location,
//!         MonitorConfig::default(),
//!         Arc::new(IconCache::embedded()),
//!         Arc::new(SystemThemeDetector::new(ThemePreference::Auto)),
//!     );
//!
//!     let mut changes = monitor.subscribe();
//!     if let Ok(change) = changes.recv().await {
//!         println!("Trash empty: {}", change.state.is_empty);
//!     }
//!
//!     monitor.shutdown().await;
//! }
//! ```

mod container;
mod error;
mod icon;
mod memory;
mod state;
mod sync;
mod theme;

pub use {
    container::{
        DirectoryProbe, SystemTrash, TrashLayout, TrashLocation, TrashPlatform, TrashProbe,
    },
    error::{CoreError, Result as CoreResult},
    icon::{EmbeddedIcons, IconCache, IconKey, IconOrigin, IconSource, IndicatorImage},
    memory::{
        MemorySampler, MemorySteward, MemoryTrimmer, OptimizeOutcome, PressureLevel,
        ProcessMemorySampler, StewardConfig, SystemTrimmer, TrimLevel,
    },
    state::{DegradeReason, FailurePolicy, ProbeOutcome, TrashState, TrashStats},
    sync::{
        ChangeWatch, CoalescerConfig, CoalescerState, DEBOUNCE_INTERVAL, DebounceCoalescer,
        IndicatorChange, MIN_INTERVAL, MonitorConfig, RecheckOutcome, StateSynchronizer,
        SynchronizerDeps, TrashMonitor, TriggerAction,
    },
    theme::{IndicatorTheme, SystemThemeDetector, ThemeDetector, ThemePreference},
};
