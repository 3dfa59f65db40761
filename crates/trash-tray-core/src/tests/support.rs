use crate::{
    DegradeReason, IconCache, IndicatorTheme, MemorySampler, MemoryTrimmer, ProbeOutcome,
    SynchronizerDeps, ThemeDetector, TrashProbe, TrashStats, TrimLevel,
};

use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use tokio_util::sync::CancellationToken;

/// Probe with scripted answers that records concurrency.
#[derive(Default)]
pub(crate) struct FakeProbe {
    pub empty: AtomicBool,
    pub degraded: AtomicBool,
    pub items: AtomicU64,
    pub delay_ms: AtomicU64,
    pub quick_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl FakeProbe {
    pub fn reporting_empty() -> Arc<Self> {
        let probe = Self::default();
        probe.empty.store(true, Ordering::SeqCst);
        Arc::new(probe)
    }

    pub fn reporting_full(items: u64) -> Arc<Self> {
        let probe = Self::default();
        probe.items.store(items, Ordering::SeqCst);
        Arc::new(probe)
    }

    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn quick_calls(&self) -> usize {
        self.quick_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, cancel: &CancellationToken) -> bool {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let mut remaining = self.delay_ms.load(Ordering::SeqCst);
        while remaining > 0 {
            if cancel.is_cancelled() {
                return false;
            }
            let step = remaining.min(5);
            thread::sleep(Duration::from_millis(step));
            remaining -= step;
        }
        true
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}

impl TrashProbe for FakeProbe {
    fn quick_check(&self, cancel: &CancellationToken) -> ProbeOutcome<bool> {
        self.quick_calls.fetch_add(1, Ordering::SeqCst);
        let finished = self.enter(cancel);
        self.leave();

        if !finished {
            ProbeOutcome::Cancelled
        } else if self.degraded() {
            ProbeOutcome::Degraded(DegradeReason::from(&io::Error::from(
                io::ErrorKind::PermissionDenied,
            )))
        } else {
            ProbeOutcome::Ok(self.empty.load(Ordering::SeqCst))
        }
    }

    fn detailed_stats(&self, cancel: &CancellationToken) -> ProbeOutcome<TrashStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let finished = self.enter(cancel);
        self.leave();

        if !finished {
            return ProbeOutcome::Cancelled;
        }
        if self.degraded() {
            return ProbeOutcome::Degraded(DegradeReason::AccessDenied);
        }
        if self.empty.load(Ordering::SeqCst) {
            ProbeOutcome::Ok(TrashStats::default())
        } else {
            let items = self.items.load(Ordering::SeqCst).max(1);
            ProbeOutcome::Ok(TrashStats {
                item_count: items,
                total_bytes: items * 1024,
            })
        }
    }
}

/// Theme detector with a fixed answer.
pub(crate) struct FixedTheme(pub IndicatorTheme);

impl ThemeDetector for FixedTheme {
    fn is_dark_theme(&self) -> bool {
        self.0 == IndicatorTheme::Dark
    }
}

pub(crate) fn deps(probe: Arc<FakeProbe>, theme: IndicatorTheme) -> SynchronizerDeps {
    SynchronizerDeps {
        probe,
        icons: Arc::new(IconCache::embedded()),
        theme: Arc::new(FixedTheme(theme)),
    }
}

/// Sampler returning whatever the test stores, counting buffer releases.
#[derive(Clone, Default)]
pub(crate) struct FakeSampler(pub Arc<AtomicU64>, pub Arc<AtomicUsize>);

impl FakeSampler {
    pub fn with_rss(bytes: u64) -> Self {
        Self(Arc::new(AtomicU64::new(bytes)), Arc::default())
    }

    pub fn releases(&self) -> usize {
        self.1.load(Ordering::SeqCst)
    }
}

impl MemorySampler for FakeSampler {
    fn resident_bytes(&self) -> Option<u64> {
        Some(self.0.load(Ordering::SeqCst))
    }

    fn release_buffers(&self) {
        self.1.fetch_add(1, Ordering::SeqCst);
    }
}

/// Trimmer that records the levels it was asked for.
#[derive(Clone, Default)]
pub(crate) struct FakeTrimmer {
    pub levels: Arc<Mutex<Vec<TrimLevel>>>,
    pub delay: Duration,
}

impl FakeTrimmer {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    #[allow(clippy::unwrap_used)]
    pub fn levels(&self) -> Vec<TrimLevel> {
        self.levels.lock().unwrap().clone()
    }
}

/// Trimmer whose pass always panics.
pub(crate) struct PanickingTrimmer;

impl MemoryTrimmer for PanickingTrimmer {
    #[allow(clippy::panic)]
    fn trim(&self, _level: TrimLevel) {
        panic!("trim pass blew up");
    }
}

impl MemoryTrimmer for FakeTrimmer {
    #[allow(clippy::unwrap_used)]
    fn trim(&self, level: TrimLevel) {
        thread::sleep(self.delay);
        self.levels.lock().unwrap().push(level);
    }
}
