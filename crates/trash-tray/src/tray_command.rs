use trash_tray_core::{IndicatorImage, TrashState};

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`),
/// so all tray mutations and process lifecycle events flow through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Show a new indicator image.
    SetImage(IndicatorImage),
    /// Refresh the item/size labels and tooltip.
    SetStats(TrashState),
    /// Shut down the application. The main thread releases the tray icon
    /// and exits the event loop.
    Shutdown,
}
