//! Desktop notifications for user-initiated commands.

use notify_rust::Notification;
use tracing::{debug, warn};

const APP_NAME: &str = "Trash Tray";

/// Show a notification without blocking the async runtime.
///
/// Failures are logged; a missing notification daemon never fails a command.
pub async fn notify(summary: impl Into<String>, body: impl Into<String>) {
    let summary = summary.into();
    let body = body.into();

    let shown = tokio::task::spawn_blocking(move || {
        Notification::new()
            .appname(APP_NAME)
            .summary(&summary)
            .body(&body)
            .show()
            .map(|_| ())
    })
    .await;

    match shown {
        Ok(Ok(())) => debug!("Notification shown"),
        Ok(Err(e)) => warn!(error = %e, "Failed to show notification"),
        Err(e) => warn!(error = %e, "Notification task failed"),
    }
}
