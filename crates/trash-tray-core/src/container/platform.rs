use crate::{
    CoreError, CoreResult, DirectoryProbe, ProbeOutcome, TrashLayout, TrashLocation, TrashProbe,
    TrashStats,
};

use std::{fs, io, panic::Location, path::Path};

use error_location::ErrorLocation;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Platform calls behind the user-facing commands.
///
/// Unlike [`TrashProbe`], failures here are reported to the caller so they
/// can be shown to the user.
pub trait TrashPlatform: Send + Sync {
    /// Item count and total byte size of the trash.
    fn query_size(&self) -> CoreResult<TrashStats>;

    /// Permanently delete everything in the trash.
    fn empty(&self) -> CoreResult<()>;

    /// Whether [`TrashPlatform::empty`] can work here at all.
    fn can_empty(&self) -> bool {
        true
    }
}

/// The trash shown by the indicator.
///
/// Emptying the desktop's own trash goes through the platform trash API;
/// a configured directory has its items deleted in place.
#[derive(Debug, Clone)]
pub struct SystemTrash {
    probe: DirectoryProbe,
}

impl SystemTrash {
    /// Trash backed by `location`.
    pub fn new(location: TrashLocation) -> Self {
        Self {
            probe: DirectoryProbe::new(location),
        }
    }
}

impl TrashPlatform for SystemTrash {
    #[track_caller]
    #[instrument(skip(self))]
    fn query_size(&self) -> CoreResult<TrashStats> {
        match self.probe.detailed_stats(&CancellationToken::new()) {
            ProbeOutcome::Ok(stats) => Ok(stats),
            ProbeOutcome::Degraded(reason) => Err(CoreError::PlatformQueryFailed {
                reason: format!(
                    "{} could not be read: {reason:?}",
                    self.probe.location().path().display()
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
            ProbeOutcome::Cancelled => Err(CoreError::PlatformQueryFailed {
                reason: "query was cancelled".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.probe.location().path()))]
    fn empty(&self) -> CoreResult<()> {
        if self.probe.location().is_native() {
            empty_native()
        } else {
            self.empty_directory()
        }
    }

    fn can_empty(&self) -> bool {
        !self.probe.location().is_native() || NATIVE_EMPTY_SUPPORTED
    }
}

impl SystemTrash {
    /// Delete every item of a configured directory.
    ///
    /// Items that vanish meanwhile are fine; any other failure stops the pass
    /// and is reported.
    #[track_caller]
    fn empty_directory(&self) -> CoreResult<()> {
        let caller = Location::caller();
        let location = self.probe.location();
        let items = match self.probe.item_paths(&CancellationToken::new()) {
            ProbeOutcome::Ok(items) => items,
            ProbeOutcome::Degraded(reason) => {
                return Err(CoreError::EmptyFailed {
                    reason: format!(
                        "{} could not be read: {reason:?}",
                        location.path().display()
                    ),
                    location: ErrorLocation::from(caller),
                });
            }
            ProbeOutcome::Cancelled => {
                return Err(CoreError::EmptyFailed {
                    reason: "empty was cancelled".to_string(),
                    location: ErrorLocation::from(caller),
                });
            }
        };

        let layout = location.layout();
        for item in &items {
            remove_item(item).map_err(|e| CoreError::EmptyFailed {
                reason: format!("Failed to delete {}: {e}", item.display()),
                location: ErrorLocation::from(caller),
            })?;
            if layout == TrashLayout::RecycleBin {
                remove_recycle_metadata(item);
            }
        }

        info!(items = items.len(), path = ?location.path(), "Trash directory emptied");

        Ok(())
    }
}

/// Delete one item, file or directory, without following symlinks.
fn remove_item(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Drop the `$I…` record paired with a deleted `$R…` item.
fn remove_recycle_metadata(item: &Path) {
    let Some(name) = item.file_name().and_then(|name| name.to_str()) else {
        return;
    };
    let Some(suffix) = name.strip_prefix("$R") else {
        return;
    };
    let record = item.with_file_name(format!("$I{suffix}"));
    match fs::remove_file(&record) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            debug!(path = ?record, error = %e, "Recycle Bin record left behind");
        }
        _ => {}
    }
}

const NATIVE_EMPTY_SUPPORTED: bool = cfg!(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
));

#[cfg(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
))]
#[track_caller]
fn empty_native() -> CoreResult<()> {
    let items = ::trash::os_limited::list().map_err(|e| CoreError::EmptyFailed {
        reason: format!("Failed to list trash: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let count = items.len();
    if count == 0 {
        return Ok(());
    }

    ::trash::os_limited::purge_all(items).map_err(|e| CoreError::EmptyFailed {
        reason: format!("Failed to purge trash: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!(items = count, "Trash emptied");

    Ok(())
}

#[cfg(not(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
)))]
#[track_caller]
fn empty_native() -> CoreResult<()> {
    Err(CoreError::Unsupported {
        operation: "empty trash",
        location: ErrorLocation::from(Location::caller()),
    })
}
