use crate::{CoalescerConfig, CoalescerState, DebounceCoalescer, TriggerAction};

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{Instant, sleep},
};
use tokio_util::sync::CancellationToken;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// WHAT: A burst of signals produces one dispatch, DEBOUNCE after the last
/// WHY: Emptying the trash fires dozens of events; only one re-check may follow
#[test]
fn given_burst_of_triggers_when_timer_fires_then_single_dispatch_after_last_trigger() {
    // Given: A coalescer that has never dispatched
    let mut coalescer = DebounceCoalescer::new(CoalescerConfig::default());
    let start = Instant::now();

    // When: Ten triggers arrive 50ms apart
    let mut last = start;
    for i in 0..10 {
        last = start + ms(i * 50);
        let action = coalescer.on_trigger(last);
        assert_eq!(action, TriggerAction::Armed(last + ms(500)));
    }

    // Then: Nothing fires before last + 500ms, exactly one dispatch at it
    assert!(!coalescer.on_timer(last + ms(499)));
    assert!(coalescer.on_timer(last + ms(500)));
    assert!(!coalescer.on_timer(last + ms(501)));
    assert_eq!(coalescer.state(), CoalescerState::Idle);
    assert_eq!(coalescer.last_dispatch(), Some(last + ms(500)));
}

/// WHAT: A single isolated trigger also waits out the debounce window
/// WHY: Trailing-edge mode treats every burst, even of one event, the same
#[test]
fn given_single_trigger_when_idle_then_dispatch_is_deferred() {
    // Given: An idle coalescer
    let mut coalescer = DebounceCoalescer::new(CoalescerConfig::default());
    let now = Instant::now();

    // When: One trigger arrives
    let action = coalescer.on_trigger(now);

    // Then: The timer is armed rather than dispatching
    assert_eq!(action, TriggerAction::Armed(now + ms(500)));
    assert_eq!(
        coalescer.state(),
        CoalescerState::Pending {
            deadline: now + ms(500)
        }
    );
}

/// WHAT: Consecutive dispatches are at least MIN_INTERVAL apart
/// WHY: A short debounce must not let re-checks run back to back
#[test]
fn given_recent_dispatch_when_triggered_then_deadline_respects_min_interval() {
    // Given: A short debounce and a long minimum spacing
    let mut coalescer = DebounceCoalescer::new(CoalescerConfig {
        debounce: ms(50),
        min_interval: ms(300),
        leading_edge: false,
    });
    let start = Instant::now();
    coalescer.on_trigger(start);
    assert!(coalescer.on_timer(start + ms(50)));

    // When: Another trigger arrives right after the dispatch
    let action = coalescer.on_trigger(start + ms(60));

    // Then: The deadline is pushed to last dispatch + min interval
    assert_eq!(action, TriggerAction::Armed(start + ms(350)));
    assert!(!coalescer.on_timer(start + ms(110)));
    assert!(coalescer.on_timer(start + ms(350)));
}

/// WHAT: Leading-edge mode dispatches immediately when spacing allows
/// WHY: Keeps the immediate-dispatch behaviour available for quick feedback
#[test]
fn given_leading_edge_when_triggered_twice_then_first_dispatches_and_second_defers() {
    // Given: Leading-edge coalescing
    let mut coalescer = DebounceCoalescer::new(CoalescerConfig {
        leading_edge: true,
        ..CoalescerConfig::default()
    });
    let start = Instant::now();

    // When: Two triggers arrive 100ms apart
    let first = coalescer.on_trigger(start);
    let second = coalescer.on_trigger(start + ms(100));

    // Then: The first dispatches now, the second waits for the debounce
    assert_eq!(first, TriggerAction::Dispatch);
    assert_eq!(second, TriggerAction::Armed(start + ms(600)));
}

/// WHAT: The async driver emits one dispatch for 50 rapid signals
/// WHY: Verifies the timer restart happens through the real select loop
#[tokio::test(start_paused = true)]
async fn given_fifty_rapid_signals_when_driver_runs_then_one_dispatch() {
    // Given: A running coalescer driver
    let (signal_tx, signal_rx) = mpsc::channel(64);
    let (dispatch_tx, mut dispatch_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let driver = tokio::spawn(
        DebounceCoalescer::new(CoalescerConfig::default()).run(
            signal_rx,
            dispatch_tx,
            cancel.clone(),
        ),
    );

    // When: 50 signals arrive within 100ms
    for _ in 0..50 {
        let _ = signal_tx.send(()).await;
        sleep(ms(2)).await;
    }

    // Then: Nothing is dispatched while the window is open...
    sleep(ms(300)).await;
    assert!(dispatch_rx.try_recv().is_err());

    // ...and exactly one dispatch follows once it closes
    sleep(ms(300)).await;
    assert!(dispatch_rx.try_recv().is_ok());
    sleep(ms(2000)).await;
    assert!(dispatch_rx.try_recv().is_err());

    cancel.cancel();
    assert!(driver.await.is_ok());
}

/// WHAT: Cancelling the token stops a pending timer without dispatching
/// WHY: Shutdown must stop the debounce timer
#[tokio::test(start_paused = true)]
async fn given_pending_timer_when_cancelled_then_driver_exits_without_dispatch() {
    // Given: A driver with an armed timer
    let (signal_tx, signal_rx) = mpsc::channel(8);
    let (dispatch_tx, mut dispatch_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let driver = tokio::spawn(
        DebounceCoalescer::new(CoalescerConfig::default()).run(
            signal_rx,
            dispatch_tx,
            cancel.clone(),
        ),
    );
    let _ = signal_tx.send(()).await;
    sleep(ms(10)).await;

    // When: The token is cancelled before the deadline
    cancel.cancel();

    // Then: The driver exits and never dispatches
    assert!(driver.await.is_ok());
    assert!(dispatch_rx.recv().await.is_none());
}
