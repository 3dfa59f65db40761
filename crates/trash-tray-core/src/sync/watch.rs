use crate::{CoreError, CoreResult, TrashLocation};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Live filesystem subscription on the trash directory.
///
/// Dropping the value releases the OS watch.
pub struct ChangeWatch {
    watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ChangeWatch {
    /// Subscribe recursively to create/remove/modify events below the trash.
    ///
    /// Each relevant event becomes one `()` on `signals`. Delivery uses
    /// `try_send`, so the notifier thread never blocks; a full channel
    /// already holds a pending signal and the extra one is dropped.
    ///
    /// Returns `Ok(None)` without subscribing when the directory is missing.
    #[track_caller]
    #[instrument(skip(signals), fields(path = ?location.path()))]
    pub fn subscribe(
        location: &TrashLocation,
        signals: mpsc::Sender<()>,
    ) -> CoreResult<Option<Self>> {
        let path = location.path().to_path_buf();
        if !location.exists() {
            info!("Trash directory missing, change watch skipped");
            return Ok(None);
        }

        let caller = Location::caller();
        let watch_error = |source: notify::Error| CoreError::WatchFailed {
            path: path.clone(),
            source,
            location: ErrorLocation::from(caller),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_relevant(&event.kind) => {
                let _ = signals.try_send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Change notification error"),
        })
        .map_err(&watch_error)?;

        watcher
            .watch(&path, RecursiveMode::Recursive)
            .map_err(&watch_error)?;

        info!("Watching trash for changes");

        Ok(Some(Self { watcher, path }))
    }

    /// Directory being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching and release the subscription.
    pub fn close(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.path) {
            debug!(error = %e, "Unwatch failed, dropping watcher anyway");
        }
        info!(path = ?self.path, "Change watch released");
    }
}

/// Whether an event may change trash contents.
pub(crate) fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_) | EventKind::Any
    )
}
