use crate::{
    CoalescerConfig, IconCache, IndicatorTheme, MonitorConfig, TrashLayout, TrashLocation,
    TrashMonitor,
    tests::support::{FakeProbe, FixedTheme, deps},
};

use std::{fs, sync::Arc, time::Duration};

use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn missing_location(dir: &TempDir) -> TrashLocation {
    TrashLocation::new(dir.path().join("no-such-trash"), TrashLayout::Flat)
}

/// WHAT: A missing trash directory starts an unwatched, empty monitor
/// WHY: A user who never trashed anything has no trash directory yet
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_missing_trash_dir_when_started_then_not_watching_and_empty() {
    // Given: A trash path that does not exist
    let dir = TempDir::new().unwrap();
    let location = missing_location(&dir);

    // When: The system monitor starts and a refresh is forced
    let monitor = TrashMonitor::start_system(
        location,
        MonitorConfig::default(),
        Arc::new(IconCache::embedded()),
        Arc::new(FixedTheme(IndicatorTheme::Light)),
    );
    let state = monitor.force_recheck().await;

    // Then: No watch exists and the trash reads as genuinely empty
    assert!(!monitor.is_watching());
    assert!(state.is_empty);
    assert_eq!(state.item_count, 0);

    monitor.shutdown().await;
}

/// WHAT: 50 signals within 100ms cause exactly one re-check
/// WHY: Event storms must coalesce into a single probe
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_signal_storm_when_window_closes_then_exactly_one_recheck() {
    // Given: A running monitor whose initial re-check has finished
    let dir = TempDir::new().unwrap();
    let probe = FakeProbe::reporting_empty();
    let monitor = TrashMonitor::start(
        &missing_location(&dir),
        MonitorConfig::default(),
        deps(Arc::clone(&probe), IndicatorTheme::Light),
    );
    sleep(Duration::from_millis(100)).await;
    let baseline = probe.quick_calls();
    assert_eq!(baseline, 1);

    // When: 50 change signals arrive over ~100ms
    for _ in 0..50 {
        monitor.signal_change();
        sleep(Duration::from_millis(2)).await;
    }

    // Then: No re-check before the debounce window closes, one after it
    sleep(Duration::from_millis(200)).await;
    assert_eq!(probe.quick_calls(), baseline);
    sleep(Duration::from_millis(700)).await;
    assert_eq!(probe.quick_calls(), baseline + 1);

    monitor.shutdown().await;
}

/// WHAT: Dropping a file into a watched trash flips the indicator to full
/// WHY: End-to-end path from the OS watch to the indicator swap
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_watched_trash_when_file_added_then_indicator_becomes_full() {
    // Given: A monitor over an existing, empty directory with a short debounce
    let dir = TempDir::new().unwrap();
    let location = TrashLocation::new(dir.path(), TrashLayout::Flat);
    let config = MonitorConfig {
        coalescer: CoalescerConfig {
            debounce: Duration::from_millis(50),
            min_interval: Duration::from_millis(10),
            leading_edge: false,
        },
        ..MonitorConfig::default()
    };
    let monitor = TrashMonitor::start_system(
        location,
        config,
        Arc::new(IconCache::embedded()),
        Arc::new(FixedTheme(IndicatorTheme::Light)),
    );
    let mut changes = monitor.subscribe();
    assert!(monitor.is_watching());
    sleep(Duration::from_millis(100)).await;

    // When: A file appears in the trash
    fs::write(dir.path().join("report.txt"), b"trashed content").unwrap();

    // Then: The indicator switches to full with counts
    let change = timeout(Duration::from_secs(5), changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!change.state.is_empty);
    assert_eq!(change.state.item_count, 1);
    assert_eq!(change.state.byte_size, 15);
    assert!(!monitor.current_state().is_empty);

    monitor.shutdown().await;
}

/// WHAT: Shutdown twice is harmless and stops further re-checks
/// WHY: Exit may race with other teardown paths
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_running_monitor_when_shut_down_twice_then_second_is_noop() {
    // Given: A running monitor
    let dir = TempDir::new().unwrap();
    let probe = FakeProbe::reporting_empty();
    let monitor = TrashMonitor::start(
        &missing_location(&dir),
        MonitorConfig::default(),
        deps(Arc::clone(&probe), IndicatorTheme::Light),
    );
    sleep(Duration::from_millis(50)).await;

    // When: Shutdown runs twice and a signal follows
    monitor.shutdown().await;
    monitor.shutdown().await;
    let calls = probe.quick_calls();
    monitor.signal_change();
    sleep(Duration::from_millis(700)).await;

    // Then: Nothing else was probed
    assert_eq!(probe.quick_calls(), calls);
    assert!(!monitor.is_watching());
}
