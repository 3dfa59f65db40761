//! Trash-Tray: a system tray indicator that mirrors the desktop trash.

mod app;
mod app_command;
mod config;
mod error;
mod format;
mod logging;
mod notifier;
mod tray_command;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::{AppCommand, MenuIds},
    error::{AppError, Result as AppResult},
    tray_command::TrayCommand,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tracing::error;
use trash_tray_core::{
    IconCache, IndicatorTheme, MonitorConfig, SystemThemeDetector, SystemTrash, ThemeDetector,
    TrashLocation, TrashMonitor, TrashPlatform,
};

/// Application entry point.
fn main() {
    let _log_guard = logging::init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    // It is created once the loop is running; dropping it removes the icon.
    let mut tray_manager: Option<TrayManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                let Some(tray) = tray_manager.as_mut() else {
                    return;
                };
                match cmd {
                    TrayCommand::SetImage(image) => {
                        if let Err(e) = tray.set_image(&image) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::SetStats(state) => {
                        if let Err(e) = tray.set_stats(state) {
                            error!(error = ?e, "Failed to update tray labels");
                        }
                    }
                    TrayCommand::Shutdown => {
                        tray_manager = None;
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
            }
            Event::NewEvents(StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let Some(location) = TrashLocation::resolve(config.watch.trash_path.as_deref())
                else {
                    error!("Could not determine the trash directory");
                    std::process::exit(1);
                };

                let icons = Arc::new(IconCache::embedded());
                let theme: Arc<dyn ThemeDetector> =
                    Arc::new(SystemThemeDetector::new(config.indicator.theme));
                let platform: Arc<dyn TrashPlatform> =
                    Arc::new(SystemTrash::new(location.clone()));
                // The theme query can spawn a process; the first re-check on the
                // runtime thread corrects the image.
                let initial = icons.get(true, IndicatorTheme::Light);

                let tray = match TrayManager::new(&initial, platform.can_empty()) {
                    Ok(tm) => tm,
                    Err(e) => {
                        error!("Failed to create TrayManager: {:?}", e);
                        std::process::exit(1);
                    }
                };
                let menu_ids = tray.menu_ids().clone();
                tray_manager = Some(tray);

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let tray_proxy = tray_proxy.clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager stays on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let monitor_config = MonitorConfig {
                            coalescer: config.watch.coalescer(),
                            failure_policy: config.indicator.failure_policy,
                        };
                        let monitor = Arc::new(TrashMonitor::start_system(
                            location.clone(),
                            monitor_config,
                            icons,
                            theme,
                        ));

                        let app = App {
                            config,
                            platform,
                            location,
                            monitor,
                            tray_proxy: tray_proxy.clone(),
                            menu_ids,
                        };

                        if let Err(e) = app.run().await {
                            error!(error = ?e, "App error");
                            let _ = tray_proxy.send_event(TrayCommand::Shutdown);
                        }
                    });
                });
            }
            _ => {}
        }
    });
}
