//! Keeps the resident footprint of a long-running tray process in check.
//!
//! Two timers sample memory: a slow one that trims above the pressure
//! threshold and a faster one that escalates above the critical threshold.
//! At most one trim pass runs at a time; a request while one is running is
//! dropped.

use crate::{MemorySampler, MemoryTrimmer, ProcessMemorySampler, SystemTrimmer, TrimLevel};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, instrument, warn};

const MIB: u64 = 1024 * 1024;

/// Steward timings and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StewardConfig {
    /// Period of the pressure check.
    pub check_interval: Duration,
    /// Period of the critical-threshold monitor.
    pub monitor_interval: Duration,
    /// Resident bytes above which a standard trim runs.
    pub pressure_threshold: u64,
    /// Resident bytes above which an aggressive trim runs.
    pub critical_threshold: u64,
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5 * 60),
            monitor_interval: Duration::from_secs(60),
            pressure_threshold: 64 * MIB,
            critical_threshold: 128 * MIB,
        }
    }
}

/// Where resident memory sits relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PressureLevel {
    /// Below the pressure threshold, or unknown.
    Normal,
    /// Above the pressure threshold.
    High,
    /// Above the critical threshold.
    Critical,
}

/// Result of [`MemorySteward::optimize_now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeOutcome {
    /// A pass ran.
    Completed {
        /// Resident bytes before the pass.
        before: Option<u64>,
        /// Resident bytes after the pass.
        after: Option<u64>,
    },
    /// Another pass was already running.
    Skipped,
    /// The pass panicked or was cancelled before finishing.
    Failed,
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    Periodic,
    Monitor,
}

/// Single-flight memory trimming on a schedule and on demand.
pub struct MemorySteward {
    config: StewardConfig,
    sampler: Box<dyn MemorySampler>,
    trimmer: Box<dyn MemoryTrimmer>,
    in_flight: AtomicBool,
    passes: AtomicU64,
}

/// Clears the in-flight flag even if the trim panics.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MemorySteward {
    /// Steward using the given sampler and trimmer.
    pub fn new(
        config: StewardConfig,
        sampler: impl MemorySampler + 'static,
        trimmer: impl MemoryTrimmer + 'static,
    ) -> Self {
        Self {
            config,
            sampler: Box::new(sampler),
            trimmer: Box::new(trimmer),
            in_flight: AtomicBool::new(false),
            passes: AtomicU64::new(0),
        }
    }

    /// Steward for this process using `sysinfo` and the system allocator.
    pub fn system(config: StewardConfig) -> Self {
        Self::new(config, ProcessMemorySampler::new(), SystemTrimmer)
    }

    /// Configured thresholds and timings.
    pub fn config(&self) -> StewardConfig {
        self.config
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Whether a pass is currently running.
    pub fn is_optimizing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether resident memory exceeds the pressure threshold.
    pub fn is_under_pressure(&self) -> bool {
        self.pressure_level() >= PressureLevel::High
    }

    /// Classify current resident memory.
    pub fn pressure_level(&self) -> PressureLevel {
        match self.sampler.resident_bytes() {
            Some(rss) if rss > self.config.critical_threshold => PressureLevel::Critical,
            Some(rss) if rss > self.config.pressure_threshold => PressureLevel::High,
            _ => PressureLevel::Normal,
        }
    }

    /// Run one trim pass on a blocking thread. No-op while another runs.
    #[instrument(skip(self))]
    pub async fn optimize_now(self: &Arc<Self>, level: TrimLevel) -> OptimizeOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Optimization already running, skipped");
            return OptimizeOutcome::Skipped;
        }

        let steward = Arc::clone(self);
        let pass = tokio::task::spawn_blocking(move || {
            let _guard = PassGuard(&steward.in_flight);
            let before = steward.sampler.resident_bytes();
            if level == TrimLevel::Aggressive {
                steward.sampler.release_buffers();
            }
            steward.trimmer.trim(level);
            let after = steward.sampler.resident_bytes();
            steward.passes.fetch_add(1, Ordering::AcqRel);
            (before, after)
        });

        match pass.await {
            Ok((before, after)) => {
                info!(?level, ?before, ?after, "Memory optimization complete");
                OptimizeOutcome::Completed { before, after }
            }
            Err(e) => {
                error!(error = %e, "Memory optimization task failed");
                OptimizeOutcome::Failed
            }
        }
    }

    /// One tick of the slow timer: trim if under pressure.
    pub async fn periodic_check(self: &Arc<Self>) -> Option<OptimizeOutcome> {
        if self.sample_level().await >= PressureLevel::High {
            Some(self.optimize_now(TrimLevel::Standard).await)
        } else {
            None
        }
    }

    /// One tick of the fast monitor: escalate above the critical threshold.
    pub async fn monitor_check(self: &Arc<Self>) -> Option<OptimizeOutcome> {
        match self.sample_level().await {
            PressureLevel::Critical => {
                warn!("Resident memory above critical threshold");
                Some(self.optimize_now(TrimLevel::Aggressive).await)
            }
            PressureLevel::High => Some(self.optimize_now(TrimLevel::Standard).await),
            PressureLevel::Normal => None,
        }
    }

    /// Spawn both timers on `tracker`; they stop when `cancel` fires.
    pub fn spawn(self: Arc<Self>, tracker: &TaskTracker, cancel: CancellationToken) {
        let periodic = Arc::clone(&self);
        let periodic_cancel = cancel.clone();
        tracker.spawn(async move { periodic.run_timer(Timer::Periodic, periodic_cancel).await });
        tracker.spawn(async move { self.run_timer(Timer::Monitor, cancel).await });

        info!("Memory steward started");
    }

    async fn run_timer(self: Arc<Self>, kind: Timer, cancel: CancellationToken) {
        let period = match kind {
            Timer::Periodic => self.config.check_interval,
            Timer::Monitor => self.config.monitor_interval,
        };
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so startup stays quiet.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {
                    let _ = match kind {
                        Timer::Periodic => self.periodic_check().await,
                        Timer::Monitor => self.monitor_check().await,
                    };
                }
            }
        }
        debug!(?kind, "Memory timer stopped");
    }

    async fn sample_level(self: &Arc<Self>) -> PressureLevel {
        let steward = Arc::clone(self);
        tokio::task::spawn_blocking(move || steward.pressure_level())
            .await
            .unwrap_or(PressureLevel::Normal)
    }
}
