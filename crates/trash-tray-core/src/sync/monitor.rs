//! Wiring of watch → coalescer → synchronizer under one shutdown token.

use crate::{
    ChangeWatch, CoalescerConfig, DebounceCoalescer, DirectoryProbe, FailurePolicy, IconCache,
    IndicatorChange, IndicatorImage, StateSynchronizer, SynchronizerDeps, ThemeDetector,
    TrashLocation, TrashState,
};

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, instrument, warn};

/// Pending change signals kept between the watch and the coalescer.
const SIGNAL_CAPACITY: usize = 64;

/// How long shutdown waits for background tasks before giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Monitor settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorConfig {
    /// Debounce timings.
    pub coalescer: CoalescerConfig,
    /// What a failed probe means for the held state.
    pub failure_policy: FailurePolicy,
}

/// Keeps the indicator in sync with the trash until shut down.
pub struct TrashMonitor {
    synchronizer: Arc<StateSynchronizer>,
    watch: Mutex<Option<ChangeWatch>>,
    signals: mpsc::Sender<()>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TrashMonitor {
    /// Start monitoring `location` with the on-disk probe.
    pub fn start_system(
        location: TrashLocation,
        config: MonitorConfig,
        icons: Arc<IconCache>,
        theme: Arc<dyn ThemeDetector>,
    ) -> Self {
        let deps = SynchronizerDeps {
            probe: Arc::new(DirectoryProbe::new(location.clone())),
            icons,
            theme,
        };
        Self::start(&location, config, deps)
    }

    /// Subscribe to `location`, spawn the background tasks and schedule the
    /// first re-check. Must be called from within a Tokio runtime.
    ///
    /// A missing directory or a failed subscription leaves the monitor
    /// running without automatic updates; [`TrashMonitor::force_recheck`]
    /// still works.
    #[instrument(skip(config, deps), fields(path = ?location.path()))]
    pub fn start(location: &TrashLocation, config: MonitorConfig, deps: SynchronizerDeps) -> Self {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let synchronizer = Arc::new(StateSynchronizer::new(
            deps,
            config.failure_policy,
            cancel.child_token(),
        ));

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CAPACITY);
        let watch = match ChangeWatch::subscribe(location, signal_tx.clone()) {
            Ok(watch) => watch,
            Err(e) => {
                warn!(error = %e, "Change watch unavailable, indicator will not auto-update");
                None
            }
        };

        // Capacity 1: a dispatch arriving while one is queued merges into it.
        let (dispatch_tx, mut dispatch_rx) = mpsc::channel(1);
        tracker.spawn(DebounceCoalescer::new(config.coalescer).run(
            signal_rx,
            dispatch_tx,
            cancel.clone(),
        ));

        let loop_sync = Arc::clone(&synchronizer);
        let loop_tracker = tracker.clone();
        let loop_cancel = cancel.clone();
        tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    dispatch = dispatch_rx.recv() => {
                        if dispatch.is_none() {
                            break;
                        }
                        let sync = Arc::clone(&loop_sync);
                        loop_tracker.spawn(async move { sync.recheck().await });
                    }
                }
            }
            debug!("Dispatch loop stopped");
        });

        let initial = Arc::clone(&synchronizer);
        tracker.spawn(async move { initial.recheck().await });

        info!(watching = watch.is_some(), "Trash monitor started");

        Self {
            synchronizer,
            watch: Mutex::new(watch),
            signals: signal_tx,
            tracker,
            cancel,
        }
    }

    /// Latest held snapshot, for menu labels.
    pub fn current_state(&self) -> TrashState {
        self.synchronizer.current_state()
    }

    /// Image the indicator should show right now.
    pub fn current_image(&self) -> IndicatorImage {
        self.synchronizer.current_image()
    }

    /// Receive indicator swaps.
    pub fn subscribe(&self) -> broadcast::Receiver<IndicatorChange> {
        self.synchronizer.subscribe()
    }

    /// Follow the held snapshot, including count-only updates.
    pub fn watch_state(&self) -> watch::Receiver<TrashState> {
        self.synchronizer.watch_state()
    }

    /// Whether a filesystem watch is active.
    pub fn is_watching(&self) -> bool {
        self.watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Full re-check that bypasses the coalescer.
    pub async fn force_recheck(&self) -> TrashState {
        self.synchronizer.force_recheck().await
    }

    /// Inject a "possibly changed" signal, as if the watch had fired.
    pub fn signal_change(&self) {
        let _ = self.signals.try_send(());
    }

    /// Release the watch, stop the timers, cancel in-flight probes and wait
    /// briefly for background tasks. Safe to call more than once.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if !self.synchronizer.shutdown() {
            debug!("Shutdown already performed");
            return;
        }

        let watch = self
            .watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(watch) = watch {
            watch.close();
        }

        self.cancel.cancel();
        self.tracker.close();

        match tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait()).await {
            Ok(()) => info!("Trash monitor stopped cleanly"),
            Err(_) => warn!(
                pending = self.tracker.len(),
                "Background tasks still running after shutdown grace period"
            ),
        }
    }
}
