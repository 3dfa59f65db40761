use crate::{
    AppCommand, AppError, AppResult, MenuIds, TrayCommand, config::Config, format, notifier,
};

use std::{ffi::OsString, panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, instrument, warn};
use trash_tray_core::{IndicatorChange, MemorySteward, TrashLocation, TrashMonitor, TrashPlatform};
use tray_icon::menu::MenuEvent;

/// How long shutdown waits for running commands.
const COMMAND_GRACE: Duration = Duration::from_secs(2);

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray updates back to the
/// main thread via `tray_proxy` because `TrayIcon` is `!Send` and must
/// remain on the UI thread.
pub struct App {
    pub(crate) config: Config,
    pub(crate) location: TrashLocation,
    pub(crate) monitor: Arc<TrashMonitor>,
    pub(crate) platform: Arc<dyn TrashPlatform>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) menu_ids: MenuIds,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(self) -> AppResult<()> {
        info!(path = ?self.location.path(), "Trash-Tray starting");

        let tasks = TaskTracker::new();
        let steward_cancel = CancellationToken::new();
        if self.config.memory.enabled {
            Arc::new(MemorySteward::system(self.config.memory.steward()))
                .spawn(&tasks, steward_cancel.clone());
        }

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver which
        // HAS blocking recv() -- zero polling, instant response, one thread.
        //
        // Shutdown: when tray_event_rx is dropped (main loop breaks),
        // tray_event_tx.blocking_send() fails, breaking the blocking loop.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut changes = self.monitor.subscribe();
        let mut states = self.monitor.watch_state();
        self.send_tray(TrayCommand::SetImage(self.monitor.current_image()))?;
        tasks.spawn(refresh(self.handles(), false));

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    match self.menu_ids.command_for(&event.id) {
                        Some(AppCommand::Exit) => {
                            info!("Exit requested from tray menu");
                            break;
                        }
                        Some(command) => self.dispatch(command, &tasks),
                        None => debug!(id = ?event.id, "Unhandled menu event"),
                    }
                }

                change = changes.recv() => {
                    match change {
                        Ok(change) => {
                            if let Err(e) = self.show_change(change) {
                                error!(error = ?e, "Failed to forward indicator change");
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Indicator changes lagged, resyncing");
                            let resync = self.send_tray(TrayCommand::SetImage(self.monitor.current_image()))
                                .and_then(|()| self.send_tray(TrayCommand::SetStats(self.monitor.current_state())));
                            if let Err(e) = resync {
                                error!(error = ?e, "Failed to resync tray");
                                break;
                            }
                        }
                        Err(RecvError::Closed) => {
                            info!("Indicator change channel closed, shutting down");
                            break;
                        }
                    }
                }

                changed = states.changed() => {
                    if changed.is_err() {
                        info!("Trash state channel closed, shutting down");
                        break;
                    }
                    let state = *states.borrow_and_update();
                    if let Err(e) = self.send_tray(TrayCommand::SetStats(state)) {
                        error!(error = ?e, "Failed to forward trash counts");
                        break;
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        steward_cancel.cancel();
        self.monitor.shutdown().await;

        tasks.close();
        if tokio::time::timeout(COMMAND_GRACE, tasks.wait()).await.is_err() {
            warn!(pending = tasks.len(), "Commands still running at exit");
        }

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        self.send_tray(TrayCommand::Shutdown)?;
        info!("Trash-Tray shut down successfully");

        Ok(())
    }

    /// Run a menu command without blocking the event loop.
    fn dispatch(&self, command: AppCommand, tasks: &TaskTracker) {
        info!(?command, "Menu command");
        match command {
            AppCommand::OpenTrash => {
                let target = trash_view_target(&self.location, self.config.watch.trash_path.is_some());
                if let Err(e) = open::that_detached(&target) {
                    error!(error = %e, ?target, "Failed to open trash view");
                }
            }
            AppCommand::EmptyTrash => {
                tasks.spawn(empty_trash(self.handles()));
            }
            AppCommand::Refresh => {
                tasks.spawn(refresh(self.handles(), true));
            }
            AppCommand::Exit => {}
        }
    }

    fn show_change(&self, change: IndicatorChange) -> AppResult<()> {
        self.send_tray(TrayCommand::SetImage(change.image))?;
        self.send_tray(TrayCommand::SetStats(change.state))
    }

    fn handles(&self) -> Handles {
        Handles {
            monitor: Arc::clone(&self.monitor),
            platform: Arc::clone(&self.platform),
            tray_proxy: self.tray_proxy.clone(),
            notify_on_empty: self.config.behaviour.notify_on_empty,
        }
    }

    #[track_caller]
    fn send_tray(&self, command: TrayCommand) -> AppResult<()> {
        send_tray(&self.tray_proxy, command)
    }
}

/// What a spawned command needs from the app.
#[derive(Clone)]
struct Handles {
    monitor: Arc<TrashMonitor>,
    platform: Arc<dyn TrashPlatform>,
    tray_proxy: EventLoopProxy<TrayCommand>,
    notify_on_empty: bool,
}

/// Re-enumerate the trash, update the labels and optionally report the result.
#[instrument(skip(handles))]
async fn refresh(handles: Handles, announce: bool) {
    let state = handles.monitor.force_recheck().await;
    if let Err(e) = send_tray(&handles.tray_proxy, TrayCommand::SetStats(state)) {
        debug!(error = ?e, "Tray gone before refresh finished");
        return;
    }

    if announce {
        let body = if state.is_empty {
            "The trash is empty".to_string()
        } else {
            format!(
                "{}, {}",
                format::items_label(&state),
                format::size_label(&state)
            )
        };
        notifier::notify("Trash", body).await;
    }
}

/// Empty the trash on a blocking thread, then re-check.
#[instrument(skip(handles))]
async fn empty_trash(handles: Handles) {
    let platform = Arc::clone(&handles.platform);
    let emptied = tokio::task::spawn_blocking(move || platform.empty())
        .await
        .map_err(|e| AppError::from(trash_tray_core::CoreError::from(e)))
        .and_then(|result| result.map_err(AppError::from));

    match emptied {
        Ok(()) => {
            info!("Trash emptied from tray menu");
            let state = handles.monitor.force_recheck().await;
            let _ = send_tray(&handles.tray_proxy, TrayCommand::SetStats(state));
            if handles.notify_on_empty {
                notifier::notify("Trash emptied", "All items were permanently deleted").await;
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to empty trash");
            notifier::notify("Could not empty trash", e.to_string()).await;
        }
    }
}

#[track_caller]
fn send_tray(proxy: &EventLoopProxy<TrayCommand>, command: TrayCommand) -> AppResult<()> {
    proxy
        .send_event(command)
        .map_err(|e| AppError::ChannelSendFailed {
            message: format!("Tray event loop closed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// What to hand to the desktop opener to show the trash.
///
/// A configured override opens the directory itself; otherwise the
/// platform's own trash view is used.
pub(crate) fn trash_view_target(location: &TrashLocation, overridden: bool) -> OsString {
    if overridden || cfg!(target_os = "macos") {
        location.path().as_os_str().to_os_string()
    } else if cfg!(windows) {
        OsString::from("shell:RecycleBinFolder")
    } else {
        OsString::from("trash:///")
    }
}
