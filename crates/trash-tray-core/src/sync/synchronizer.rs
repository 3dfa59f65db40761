//! Owner of the authoritative trash state and the indicator image.
//!
//! Probes run on blocking threads with no lock held. The mutex only guards
//! the compare-and-swap of state, image and the in-flight flag, and is never
//! held across an `.await`.

use crate::{
    CoreResult, FailurePolicy, IconCache, IndicatorImage, ProbeOutcome, ThemeDetector,
    TrashProbe, TrashState,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Emitted exactly when the indicator image is swapped.
#[derive(Debug, Clone)]
pub struct IndicatorChange {
    /// State that caused the swap.
    pub state: TrashState,
    /// New indicator image.
    pub image: IndicatorImage,
}

/// Result of one re-check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecheckOutcome {
    /// Emptiness did not change; the indicator was left alone. Counts may
    /// still have been refreshed.
    Unchanged,
    /// Emptiness changed and the indicator image was swapped.
    Changed,
    /// Another re-check was already in flight.
    Dropped,
    /// The probe degraded and the failure policy kept the last state.
    Degraded,
    /// The probe task failed unexpectedly; treated as no change.
    Failed,
    /// Shutdown interrupted the probe.
    Cancelled,
    /// Shutdown already happened; nothing was probed.
    ShutDown,
}

/// Collaborators used by the synchronizer.
#[derive(Clone)]
pub struct SynchronizerDeps {
    /// Trash observer.
    pub probe: Arc<dyn TrashProbe>,
    /// Shared image cache.
    pub icons: Arc<IconCache>,
    /// Theme source, consulted on every swap.
    pub theme: Arc<dyn ThemeDetector>,
}

struct Shared {
    state: TrashState,
    image: IndicatorImage,
    in_flight: bool,
    shut_down: bool,
}

/// Releases the single-flight slot on every exit path.
struct FlightGuard<'a> {
    owner: &'a StateSynchronizer,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.lock().in_flight = false;
        self.owner.flight_done.notify_waiters();
    }
}

/// Keeps the held trash state and indicator image in step with the trash.
pub struct StateSynchronizer {
    shared: Mutex<Shared>,
    deps: SynchronizerDeps,
    policy: FailurePolicy,
    flight_done: Notify,
    changes: broadcast::Sender<IndicatorChange>,
    states: watch::Sender<TrashState>,
    cancel: CancellationToken,
}

impl StateSynchronizer {
    /// Start out assuming an empty trash, showing the matching cached image.
    pub fn new(deps: SynchronizerDeps, policy: FailurePolicy, cancel: CancellationToken) -> Self {
        let image = deps.icons.get(true, deps.theme.current());
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            shared: Mutex::new(Shared {
                state: TrashState::EMPTY,
                image,
                in_flight: false,
                shut_down: false,
            }),
            deps,
            policy,
            flight_done: Notify::new(),
            changes,
            states: watch::Sender::new(TrashState::EMPTY),
            cancel,
        }
    }

    /// Latest held snapshot.
    pub fn current_state(&self) -> TrashState {
        self.lock().state
    }

    /// Image the indicator should currently show.
    pub fn current_image(&self) -> IndicatorImage {
        self.lock().image.clone()
    }

    /// Receive every indicator swap from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<IndicatorChange> {
        self.changes.subscribe()
    }

    /// Follow the held snapshot, including count-only updates that do not
    /// swap the image.
    pub fn watch_state(&self) -> watch::Receiver<TrashState> {
        self.states.subscribe()
    }

    /// Whether a re-check is running right now.
    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Run a quick emptiness check and swap the indicator if it flipped.
    ///
    /// Dropped if a re-check is already in flight.
    #[instrument(skip(self))]
    pub async fn recheck(&self) -> RecheckOutcome {
        let _flight = match self.try_begin_flight() {
            Ok(guard) => guard,
            Err(outcome) => {
                debug!(?outcome, "Re-check skipped");
                return outcome;
            }
        };

        let mut observed = match self.run_probe(|probe, cancel| probe.quick_check(cancel)).await {
            Ok(ProbeOutcome::Ok(is_empty)) => TrashState::from_emptiness(is_empty),
            Ok(ProbeOutcome::Degraded(reason)) => match self.policy.on_degraded() {
                Some(state) => {
                    warn!(?reason, "Quick check degraded, assuming empty");
                    state
                }
                None => {
                    warn!(?reason, "Quick check degraded, keeping last state");
                    return RecheckOutcome::Degraded;
                }
            },
            Ok(ProbeOutcome::Cancelled) => return RecheckOutcome::Cancelled,
            Err(e) => {
                error!(error = %e, "Quick check task failed");
                return RecheckOutcome::Failed;
            }
        };

        // Counts are refreshed inside this flight so no second probe can
        // overlap. A failed enumeration keeps the previous counts.
        let mut counted = false;
        if !observed.is_empty {
            match self.run_probe(|probe, cancel| probe.detailed_stats(cancel)).await {
                Ok(ProbeOutcome::Ok(stats)) if stats.item_count > 0 => {
                    observed = TrashState::from_stats(stats);
                    counted = true;
                }
                Ok(ProbeOutcome::Cancelled) => return RecheckOutcome::Cancelled,
                _ => {}
            }
        }

        self.apply(observed, counted).await
    }

    /// Manual refresh: full enumeration, bypassing the coalescer.
    ///
    /// Waits for any in-flight re-check to finish first, so probes never
    /// overlap. Always returns a usable snapshot.
    #[instrument(skip(self))]
    pub async fn force_recheck(&self) -> TrashState {
        let _flight = loop {
            let notified = self.flight_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_begin_flight() {
                Ok(guard) => break guard,
                Err(RecheckOutcome::ShutDown) => return self.current_state(),
                Err(_) => {}
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.cancel.cancelled() => return self.current_state(),
            }
        };

        let observed = match self.run_probe(|probe, cancel| probe.detailed_stats(cancel)).await {
            Ok(ProbeOutcome::Ok(stats)) => Some(TrashState::from_stats(stats)),
            Ok(ProbeOutcome::Degraded(reason)) => {
                warn!(?reason, policy = ?self.policy, "Detailed stats degraded");
                self.policy.on_degraded()
            }
            Ok(ProbeOutcome::Cancelled) => None,
            Err(e) => {
                error!(error = %e, "Detailed stats task failed");
                None
            }
        };

        if let Some(observed) = observed {
            self.apply(observed, true).await;
        }

        self.current_state()
    }

    /// Stop accepting work. Returns `false` if shutdown had already begun.
    ///
    /// An in-flight probe finishing afterwards does not touch the indicator.
    pub fn shutdown(&self) -> bool {
        {
            let mut shared = self.lock();
            if shared.shut_down {
                return false;
            }
            shared.shut_down = true;
        }
        self.cancel.cancel();
        self.flight_done.notify_waiters();
        info!("State synchronizer shut down");
        true
    }

    /// Whether [`StateSynchronizer::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_begin_flight(&self) -> Result<FlightGuard<'_>, RecheckOutcome> {
        let mut shared = self.lock();
        if shared.shut_down {
            return Err(RecheckOutcome::ShutDown);
        }
        if shared.in_flight {
            return Err(RecheckOutcome::Dropped);
        }
        shared.in_flight = true;
        Ok(FlightGuard { owner: self })
    }

    async fn run_probe<T, F>(&self, probe_fn: F) -> CoreResult<ProbeOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TrashProbe, &CancellationToken) -> ProbeOutcome<T> + Send + 'static,
    {
        let probe = Arc::clone(&self.deps.probe);
        let cancel = self.cancel.clone();
        let task = tokio::task::spawn_blocking(move || probe_fn(probe.as_ref(), &cancel));

        tokio::select! {
            // The blocking probe notices the token on its own and winds down.
            _ = self.cancel.cancelled() => Ok(ProbeOutcome::Cancelled),
            joined = task => Ok(joined?),
        }
    }

    /// Adopt `observed`. Swaps the image only when emptiness flipped;
    /// `update_counts` also refreshes sizes when it did not.
    async fn apply(&self, observed: TrashState, update_counts: bool) -> RecheckOutcome {
        {
            let mut shared = self.lock();
            if shared.shut_down {
                return RecheckOutcome::ShutDown;
            }
            if shared.state.is_empty == observed.is_empty {
                if update_counts && shared.state != observed {
                    shared.state = observed;
                    self.publish_state(observed);
                    debug!(
                        items = observed.item_count,
                        bytes = observed.byte_size,
                        "Trash counts refreshed"
                    );
                }
                return RecheckOutcome::Unchanged;
            }
        }

        let theme = {
            let detector = Arc::clone(&self.deps.theme);
            tokio::task::spawn_blocking(move || detector.current())
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Theme query failed, using light");
                    crate::IndicatorTheme::Light
                })
        };
        let image = self.deps.icons.get(observed.is_empty, theme);

        {
            let mut shared = self.lock();
            if shared.shut_down {
                return RecheckOutcome::ShutDown;
            }
            shared.state = observed;
            self.publish_state(observed);
            // The previous handle is released here; cache entries stay alive
            // in the cache itself.
            shared.image = image.clone();
        }

        info!(
            is_empty = observed.is_empty,
            items = observed.item_count,
            bytes = observed.byte_size,
            ?theme,
            "Indicator updated"
        );
        let _ = self.changes.send(IndicatorChange {
            state: observed,
            image,
        });

        RecheckOutcome::Changed
    }

    fn publish_state(&self, state: TrashState) {
        self.states.send_if_modified(|held| {
            let modified = *held != state;
            *held = state;
            modified
        });
    }
}
