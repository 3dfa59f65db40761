use crate::{
    FailurePolicy, IconKey, IndicatorTheme, RecheckOutcome, StateSynchronizer,
    tests::support::{FakeProbe, deps},
};

use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

fn synchronizer(
    probe: &Arc<FakeProbe>,
    theme: IndicatorTheme,
    policy: FailurePolicy,
) -> Arc<StateSynchronizer> {
    Arc::new(StateSynchronizer::new(
        deps(Arc::clone(probe), theme),
        policy,
        CancellationToken::new(),
    ))
}

/// WHAT: An empty→full transition swaps the image and notifies once
/// WHY: The renderer repaints only on IndicatorImageChanged
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_empty_indicator_when_probe_reports_full_then_one_change_with_new_image() {
    // Given: A synchronizer showing the empty image
    let probe = FakeProbe::reporting_full(7);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    let initial = sync.current_image();
    let mut changes = sync.subscribe();

    // When: A re-check observes a full trash
    let outcome = sync.recheck().await;

    // Then: Exactly one change fires with a different, full image
    assert_eq!(outcome, RecheckOutcome::Changed);
    let change = changes.try_recv().unwrap();
    assert!(!change.image.same_as(&initial));
    assert_eq!(
        change.image.key(),
        IconKey::new(false, IndicatorTheme::Light)
    );
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));

    // And: Counts were filled in for the new full state
    let state = sync.current_state();
    assert!(!state.is_empty);
    assert_eq!(state.item_count, 7);
    assert_eq!(state.byte_size, 7 * 1024);
}

/// WHAT: Two equal probe results leave the image reference untouched
/// WHY: The equality check is the anti-flicker guarantee
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_unchanged_emptiness_when_rechecked_then_image_identity_kept() {
    // Given: A synchronizer that already reflects a full trash
    let probe = FakeProbe::reporting_full(2);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);
    let before = sync.current_image();
    let mut changes = sync.subscribe();

    // When: The next probe reports the same emptiness
    let outcome = sync.recheck().await;

    // Then: No swap and no notification
    assert_eq!(outcome, RecheckOutcome::Unchanged);
    assert!(sync.current_image().same_as(&before));
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
}

/// WHAT: Concurrent re-checks against a slow probe run one at a time
/// WHY: Only one enumeration may be in flight; extras are dropped, not queued
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::unwrap_used)]
async fn given_slow_probe_when_dispatched_concurrently_then_single_flight() {
    // Given: A probe that takes 200ms
    let probe = FakeProbe::reporting_empty();
    probe.set_delay(Duration::from_millis(200));
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);

    // When: Five re-checks are dispatched at once
    let mut handles = Vec::new();
    for _ in 0..5 {
        let sync = Arc::clone(&sync);
        handles.push(tokio::spawn(async move { sync.recheck().await }));
    }
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // Then: One ran, the rest were dropped, and probes never overlapped
    let ran = outcomes
        .iter()
        .filter(|o| **o != RecheckOutcome::Dropped)
        .count();
    assert_eq!(ran, 1);
    assert_eq!(probe.quick_calls(), 1);
    assert_eq!(probe.max_active.load(Ordering::SeqCst), 1);
    assert!(!sync.is_in_flight());
}

/// WHAT: Dark theme with an empty trash selects the dark empty image
/// WHY: Theme is resolved at swap time, and only the matching key is loaded
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_dark_theme_when_trash_becomes_empty_then_dark_empty_image_used() {
    // Given: A dark desktop and a trash that is full, then emptied
    let probe = FakeProbe::reporting_full(1);
    let deps = deps(Arc::clone(&probe), IndicatorTheme::Dark);
    let icons = Arc::clone(&deps.icons);
    let sync = StateSynchronizer::new(deps, FailurePolicy::KeepLast, CancellationToken::new());
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);
    let mut changes = sync.subscribe();

    // When: The trash becomes empty
    probe.set_empty(true);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);

    // Then: The dark empty image was fetched, the light one never
    let change = changes.try_recv().unwrap();
    assert_eq!(change.image.key(), IconKey::new(true, IndicatorTheme::Dark));
    assert!(icons.is_loaded(IconKey::new(true, IndicatorTheme::Dark)));
    assert!(!icons.is_loaded(IconKey::new(true, IndicatorTheme::Light)));
}

/// WHAT: A degraded probe keeps the last state under KeepLast
/// WHY: A transient failure must not flip a full indicator to empty
#[tokio::test(flavor = "multi_thread")]
async fn given_keep_last_policy_when_probe_degrades_then_state_retained() {
    // Given: A synchronizer reflecting a full trash
    let probe = FakeProbe::reporting_full(3);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);
    let before = sync.current_image();

    // When: The next probe fails
    probe.degraded.store(true, Ordering::SeqCst);
    let outcome = sync.recheck().await;

    // Then: State and image are untouched
    assert_eq!(outcome, RecheckOutcome::Degraded);
    assert!(!sync.current_state().is_empty);
    assert!(sync.current_image().same_as(&before));
}

/// WHAT: A degraded probe reads as empty under AssumeEmpty
/// WHY: Preserves the optimistic behaviour when configured
#[tokio::test(flavor = "multi_thread")]
async fn given_assume_empty_policy_when_probe_degrades_then_state_becomes_empty() {
    // Given: A synchronizer reflecting a full trash
    let probe = FakeProbe::reporting_full(3);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::AssumeEmpty);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);

    // When: The next probe fails
    probe.degraded.store(true, Ordering::SeqCst);
    let outcome = sync.recheck().await;

    // Then: The trash is assumed empty
    assert_eq!(outcome, RecheckOutcome::Changed);
    assert!(sync.current_state().is_empty);
}

/// WHAT: Forced re-check returns full statistics
/// WHY: The info command shows item count and size
#[tokio::test(flavor = "multi_thread")]
async fn given_full_trash_when_force_rechecked_then_stats_returned() {
    // Given: A trash holding 4 items
    let probe = FakeProbe::reporting_full(4);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);

    // When: A manual refresh runs
    let state = sync.force_recheck().await;

    // Then: The snapshot carries the enumeration totals
    assert!(!state.is_empty);
    assert_eq!(state.item_count, 4);
    assert_eq!(state.byte_size, 4 * 1024);
    assert_eq!(sync.current_state(), state);
}

/// WHAT: Forced re-check waits for an in-flight probe instead of overlapping
/// WHY: At most one probe may touch the trash at a time
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::unwrap_used)]
async fn given_probe_in_flight_when_force_rechecked_then_waits_its_turn() {
    // Given: A slow re-check already running
    let probe = FakeProbe::reporting_full(2);
    probe.set_delay(Duration::from_millis(150));
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    let background = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.recheck().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    // When: A manual refresh is requested mid-flight
    let state = sync.force_recheck().await;

    // Then: Both completed and probes never overlapped
    assert_eq!(background.await.unwrap(), RecheckOutcome::Changed);
    assert_eq!(state.item_count, 2);
    assert_eq!(probe.max_active.load(Ordering::SeqCst), 1);
}

/// WHAT: Shutdown mid-probe cancels it without touching the indicator
/// WHY: Work finishing after shutdown must not mutate the indicator
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_probe_in_flight_when_shut_down_then_cancelled_without_swap() {
    // Given: A slow probe that would report a full trash
    let probe = FakeProbe::reporting_full(1);
    probe.set_delay(Duration::from_millis(500));
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    let initial = sync.current_image();
    let mut changes = sync.subscribe();
    let pending = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.recheck().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // When: Shutdown is requested
    assert!(sync.shutdown());

    // Then: The re-check reports cancellation and nothing changed
    assert_eq!(pending.await.unwrap(), RecheckOutcome::Cancelled);
    assert!(sync.current_image().same_as(&initial));
    assert!(sync.current_state().is_empty);
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
}

/// WHAT: Shutdown is idempotent and blocks further re-checks
/// WHY: Double shutdown must neither fail nor release anything twice
#[tokio::test(flavor = "multi_thread")]
async fn given_shut_down_synchronizer_when_shut_down_again_then_noop() {
    // Given: A synchronizer that was shut down
    let probe = FakeProbe::reporting_full(1);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    assert!(sync.shutdown());

    // When: Shutdown and a re-check are requested again
    let second = sync.shutdown();
    let outcome = sync.recheck().await;

    // Then: Both are no-ops and the probe never ran
    assert!(!second);
    assert_eq!(outcome, RecheckOutcome::ShutDown);
    assert_eq!(probe.quick_calls(), 0);
    assert!(sync.is_shut_down());
}

/// WHAT: A full trash that gains items refreshes counts without a swap
/// WHY: Menu labels and tooltip must track the trash between flips
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_full_trash_when_items_added_then_counts_refreshed_without_swap() {
    // Given: A synchronizer already showing a full trash with one item
    let probe = FakeProbe::reporting_full(1);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);
    let before = sync.current_image();
    let mut changes = sync.subscribe();
    let mut states = sync.watch_state();
    states.mark_unchanged();

    // When: More items arrive and the trash is re-checked
    probe.items.store(50, Ordering::SeqCst);
    let outcome = sync.recheck().await;

    // Then: The image stays, no swap is announced
    assert_eq!(outcome, RecheckOutcome::Unchanged);
    assert!(sync.current_image().same_as(&before));
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));

    // And: The held counts and the state watch both carry the new totals
    let state = sync.current_state();
    assert_eq!(state.item_count, 50);
    assert_eq!(state.byte_size, 50 * 1024);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), state);
}

/// WHAT: A failed enumeration on a full trash keeps the previous counts
/// WHY: Zeroed labels would misreport a trash that is still full
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_full_trash_when_enumeration_degrades_then_counts_kept() {
    // Given: A full trash with three counted items
    let probe = FakeProbe::reporting_full(3);
    let sync = synchronizer(&probe, IndicatorTheme::Light, FailurePolicy::KeepLast);
    assert_eq!(sync.recheck().await, RecheckOutcome::Changed);

    // When: The probe starts failing
    probe.degraded.store(true, Ordering::SeqCst);
    let outcome = sync.recheck().await;

    // Then: The last good counts are still held
    assert_eq!(outcome, RecheckOutcome::Degraded);
    assert_eq!(sync.current_state().item_count, 3);
}

/// WHAT: A light placeholder is replaced by the themed image the synchronizer holds
/// WHY: The tray starts before the theme is known and is corrected on the runtime thread
#[tokio::test(flavor = "multi_thread")]
async fn given_light_placeholder_when_synchronizer_built_on_dark_desktop_then_dark_image_held() {
    // Given: The tray showing the light empty image from a shared cache
    let probe = FakeProbe::reporting_empty();
    let deps = deps(Arc::clone(&probe), IndicatorTheme::Dark);
    let placeholder = deps.icons.get(true, IndicatorTheme::Light);

    // When: The synchronizer is built on a dark desktop
    let sync = StateSynchronizer::new(deps, FailurePolicy::KeepLast, CancellationToken::new());

    // Then: The image to send to the tray is the dark one
    let held = sync.current_image();
    assert_eq!(held.key(), IconKey::new(true, IndicatorTheme::Dark));
    assert!(!held.same_as(&placeholder));
}
