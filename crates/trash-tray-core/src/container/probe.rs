//! Read-only inspection of the trash directory.
//!
//! Both operations run on blocking threads and race with the desktop moving
//! files in and out. Entries that vanish or cannot be read mid-walk are
//! skipped; only a failure to open the root degrades the whole result.

use crate::{DegradeReason, ProbeOutcome, TrashLayout, TrashLocation, TrashStats};

use std::{
    fs, io,
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Observes the trash container.
pub trait TrashProbe: Send + Sync {
    /// Cheapest possible emptiness check. `Ok(true)` means empty.
    fn quick_check(&self, cancel: &CancellationToken) -> ProbeOutcome<bool>;

    /// Full enumeration of item count and total size.
    fn detailed_stats(&self, cancel: &CancellationToken) -> ProbeOutcome<TrashStats>;
}

/// Probe that walks the trash directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryProbe {
    location: TrashLocation,
}

impl DirectoryProbe {
    /// Probe the given location.
    pub fn new(location: TrashLocation) -> Self {
        Self { location }
    }

    /// Location being probed.
    pub fn location(&self) -> &TrashLocation {
        &self.location
    }

    /// Paths of every top-level trashed item.
    pub(crate) fn item_paths(&self, cancel: &CancellationToken) -> ProbeOutcome<Vec<PathBuf>> {
        let mut items = Vec::new();
        match self.for_each_item(cancel, |item| {
            items.push(item.to_path_buf());
            ControlFlow::Continue(())
        }) {
            ProbeOutcome::Ok(()) => ProbeOutcome::Ok(items),
            ProbeOutcome::Degraded(reason) => ProbeOutcome::Degraded(reason),
            ProbeOutcome::Cancelled => ProbeOutcome::Cancelled,
        }
    }

    /// Visit every top-level trashed item until `visit` breaks.
    ///
    /// A missing root is an empty trash, not a failure.
    fn for_each_item(
        &self,
        cancel: &CancellationToken,
        mut visit: impl FnMut(&Path) -> ControlFlow<()>,
    ) -> ProbeOutcome<()> {
        let root = self.location.path();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ProbeOutcome::Ok(()),
            Err(e) => {
                debug!(path = ?root, error = %e, "Trash root unreadable");
                return ProbeOutcome::Degraded(DegradeReason::from(&e));
            }
        };

        let layout = self.location.layout();
        for entry in entries.flatten() {
            if cancel.is_cancelled() {
                return ProbeOutcome::Cancelled;
            }

            if layout == TrashLayout::RecycleBin {
                // Root holds one directory per user; items live one level down.
                let Ok(inner) = fs::read_dir(entry.path()) else {
                    continue;
                };
                for item in inner.flatten() {
                    if cancel.is_cancelled() {
                        return ProbeOutcome::Cancelled;
                    }
                    if layout.is_item(&item.file_name().to_string_lossy())
                        && visit(&item.path()).is_break()
                    {
                        return ProbeOutcome::Ok(());
                    }
                }
            } else if layout.is_item(&entry.file_name().to_string_lossy())
                && visit(&entry.path()).is_break()
            {
                return ProbeOutcome::Ok(());
            }
        }

        ProbeOutcome::Ok(())
    }
}

impl TrashProbe for DirectoryProbe {
    #[instrument(skip(self, cancel), fields(path = ?self.location.path()))]
    fn quick_check(&self, cancel: &CancellationToken) -> ProbeOutcome<bool> {
        let mut is_empty = true;
        match self.for_each_item(cancel, |_| {
            is_empty = false;
            ControlFlow::Break(())
        }) {
            ProbeOutcome::Ok(()) => ProbeOutcome::Ok(is_empty),
            ProbeOutcome::Degraded(reason) => ProbeOutcome::Degraded(reason),
            ProbeOutcome::Cancelled => ProbeOutcome::Cancelled,
        }
    }

    #[instrument(skip(self, cancel), fields(path = ?self.location.path()))]
    fn detailed_stats(&self, cancel: &CancellationToken) -> ProbeOutcome<TrashStats> {
        let mut stats = TrashStats::default();
        let mut cancelled = false;
        let outcome = self.for_each_item(cancel, |item| {
            stats.item_count += 1;
            match tree_size(item, cancel) {
                Some(bytes) => {
                    stats.total_bytes = stats.total_bytes.saturating_add(bytes);
                    ControlFlow::Continue(())
                }
                None => {
                    cancelled = true;
                    ControlFlow::Break(())
                }
            }
        });

        match outcome {
            ProbeOutcome::Ok(()) if cancelled => ProbeOutcome::Cancelled,
            ProbeOutcome::Ok(()) => {
                debug!(items = stats.item_count, bytes = stats.total_bytes, "Trash enumerated");
                ProbeOutcome::Ok(stats)
            }
            ProbeOutcome::Degraded(reason) => ProbeOutcome::Degraded(reason),
            ProbeOutcome::Cancelled => ProbeOutcome::Cancelled,
        }
    }
}

/// Total file bytes below `path` without following symlinks.
///
/// Returns `None` when cancelled. Unreadable entries count as zero.
fn tree_size(path: &Path, cancel: &CancellationToken) -> Option<u64> {
    let mut total = 0u64;
    let mut pending: Vec<PathBuf> = vec![path.to_path_buf()];

    while let Some(next) = pending.pop() {
        if cancel.is_cancelled() {
            return None;
        }
        let Ok(meta) = fs::symlink_metadata(&next) else {
            continue;
        };
        if meta.is_dir() {
            if let Ok(children) = fs::read_dir(&next) {
                pending.extend(children.flatten().map(|child| child.path()));
            }
        } else {
            total = total.saturating_add(meta.len());
        }
    }

    Some(total)
}
