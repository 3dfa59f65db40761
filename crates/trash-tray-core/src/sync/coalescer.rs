//! Debounce coalescer: many "possibly changed" signals in, few re-checks out.
//!
//! A burst of signals restarts the delay on every event, so the whole burst
//! produces one dispatch `debounce` after its last event. Consecutive
//! dispatches are always at least `min_interval` apart.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Default quiet period after the last signal of a burst.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(500);

/// Default minimum spacing between two dispatches.
pub const MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Coalescer timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
    /// Quiet period after the last signal before dispatching.
    pub debounce: Duration,
    /// Minimum spacing between dispatches.
    pub min_interval: Duration,
    /// Dispatch the first signal of a burst immediately when the previous
    /// dispatch is older than `min_interval`.
    pub leading_edge: bool,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_INTERVAL,
            min_interval: MIN_INTERVAL,
            leading_edge: false,
        }
    }
}

/// Coalescer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerState {
    /// No dispatch scheduled.
    Idle,
    /// A dispatch fires at `deadline` unless another signal pushes it back.
    Pending {
        /// When the delay timer fires.
        deadline: Instant,
    },
}

/// What a signal did to the coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Dispatch a re-check now.
    Dispatch,
    /// The delay timer was (re)armed for the given instant.
    Armed(Instant),
}

/// The coalescing state machine. Time is passed in, so it is fully
/// deterministic; [`DebounceCoalescer::run`] drives it from a channel.
#[derive(Debug, Clone)]
pub struct DebounceCoalescer {
    config: CoalescerConfig,
    state: CoalescerState,
    last_dispatch: Option<Instant>,
}

impl DebounceCoalescer {
    /// Idle coalescer that has never dispatched.
    pub fn new(config: CoalescerConfig) -> Self {
        Self {
            config,
            state: CoalescerState::Idle,
            last_dispatch: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> CoalescerState {
        self.state
    }

    /// Instant of the most recent dispatch.
    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Feed one "possibly changed" signal observed at `now`.
    pub fn on_trigger(&mut self, now: Instant) -> TriggerAction {
        match self.state {
            CoalescerState::Idle if self.config.leading_edge && self.spacing_elapsed(now) => {
                self.last_dispatch = Some(now);
                TriggerAction::Dispatch
            }
            CoalescerState::Idle | CoalescerState::Pending { .. } => {
                let deadline = self.deadline_from(now);
                self.state = CoalescerState::Pending { deadline };
                TriggerAction::Armed(deadline)
            }
        }
    }

    /// Timer wake-up at `now`. Returns `true` when a re-check must be dispatched.
    pub fn on_timer(&mut self, now: Instant) -> bool {
        match self.state {
            CoalescerState::Pending { deadline } if now >= deadline => {
                self.state = CoalescerState::Idle;
                self.last_dispatch = Some(now);
                true
            }
            _ => false,
        }
    }

    fn spacing_elapsed(&self, now: Instant) -> bool {
        self.last_dispatch
            .is_none_or(|last| now.saturating_duration_since(last) >= self.config.min_interval)
    }

    fn deadline_from(&self, now: Instant) -> Instant {
        let deadline = now + self.config.debounce;
        match self.last_dispatch {
            Some(last) => deadline.max(last + self.config.min_interval),
            None => deadline,
        }
    }

    /// Drive the state machine until cancelled or the signal source closes.
    ///
    /// Dispatches use `try_send`: if the consumer still holds an undelivered
    /// dispatch the new one merges into it.
    pub async fn run(
        mut self,
        mut signals: mpsc::Receiver<()>,
        dispatch: mpsc::Sender<()>,
        cancel: CancellationToken,
    ) {
        debug!(config = ?self.config, "Coalescer started");

        loop {
            let deadline = match self.state {
                CoalescerState::Pending { deadline } => Some(deadline),
                CoalescerState::Idle => None,
            };
            let timer = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let fire = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(()) => {
                        let action = self.on_trigger(Instant::now());
                        trace!(?action, "Change signal");
                        action == TriggerAction::Dispatch
                    }
                    None => break,
                },
                _ = timer => self.on_timer(Instant::now()),
            };

            if fire {
                debug!("Dispatching re-check");
                let _ = dispatch.try_send(());
            }
        }

        info!("Coalescer stopped");
    }
}
