use crate::{ChangeWatch, TrashLayout, TrashLocation, sync::watch::is_relevant};

use std::{fs, time::Duration};

use notify::{
    EventKind,
    event::{AccessKind, CreateKind, ModifyKind, RemoveKind},
};
use tempfile::TempDir;
use tokio::{sync::mpsc, time::timeout};

/// WHAT: Content-changing events are relevant, pure access is not
/// WHY: Reading the trash (our own probe included) must not trigger re-checks
#[test]
fn given_event_kinds_when_filtered_then_only_mutations_pass() {
    assert!(is_relevant(&EventKind::Create(CreateKind::File)));
    assert!(is_relevant(&EventKind::Remove(RemoveKind::Folder)));
    assert!(is_relevant(&EventKind::Modify(ModifyKind::Any)));
    assert!(is_relevant(&EventKind::Any));
    assert!(!is_relevant(&EventKind::Access(AccessKind::Read)));
    assert!(!is_relevant(&EventKind::Other));
}

/// WHAT: Subscribing to a missing directory yields no watch
/// WHY: Missing trash is a normal state, not an error
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_missing_dir_when_subscribing_then_none() {
    // Given: A path that does not exist
    let dir = TempDir::new().unwrap();
    let location = TrashLocation::new(dir.path().join("absent"), TrashLayout::Flat);
    let (tx, _rx) = mpsc::channel(4);

    // When: Subscribing
    let watch = ChangeWatch::subscribe(&location, tx).unwrap();

    // Then: No subscription was created
    assert!(watch.is_none());
}

/// WHAT: Creating a file in a watched directory produces a signal
/// WHY: The watch is the only source of automatic updates
#[tokio::test(flavor = "multi_thread")]
#[allow(clippy::unwrap_used)]
async fn given_watched_dir_when_file_created_then_signal_sent() {
    // Given: A watch on an empty directory
    let dir = TempDir::new().unwrap();
    let location = TrashLocation::new(dir.path(), TrashLayout::Flat);
    let (tx, mut rx) = mpsc::channel(4);
    let watch = ChangeWatch::subscribe(&location, tx).unwrap().unwrap();
    assert_eq!(watch.path(), dir.path());

    // When: A file is created
    fs::write(dir.path().join("deleted.txt"), b"x").unwrap();

    // Then: At least one signal arrives
    let signal = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(signal.is_some());

    watch.close();
}
