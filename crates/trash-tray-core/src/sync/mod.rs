mod coalescer;
mod monitor;
mod synchronizer;
pub(crate) mod watch;

pub use {
    coalescer::{
        CoalescerConfig, CoalescerState, DEBOUNCE_INTERVAL, DebounceCoalescer, MIN_INTERVAL,
        TriggerAction,
    },
    monitor::{MonitorConfig, TrashMonitor},
    synchronizer::{IndicatorChange, RecheckOutcome, StateSynchronizer, SynchronizerDeps},
    watch::ChangeWatch,
};
