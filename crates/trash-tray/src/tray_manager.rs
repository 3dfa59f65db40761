//! System tray icon with state-based updates.
//!
//! Shows the trash indicator image and a context menu with the current item
//! count and size, plus Open, Empty, Refresh and Exit.

use crate::{AppError, AppResult, MenuIds, format};

use std::panic::Location;

use error_location::ErrorLocation;
use trash_tray_core::{IndicatorImage, TrashState};
use tracing::{debug, info, instrument};
use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    items_label: MenuItem,
    size_label: MenuItem,
    menu_ids: MenuIds,
    shown: IndicatorImage,
}

impl TrayManager {
    /// Create the tray icon showing `initial`. The Empty item is greyed out
    /// when the trash cannot be emptied from here.
    #[track_caller]
    #[instrument(skip(initial))]
    pub fn new(initial: &IndicatorImage, can_empty: bool) -> AppResult<Self> {
        let menu = Menu::new();

        let items_label = MenuItem::new(format::items_label(&TrashState::EMPTY), false, None);
        let size_label = MenuItem::new(format::size_label(&TrashState::EMPTY), false, None);
        let open_item = MenuItem::new("Open Trash", true, None);
        let empty_item = MenuItem::new("Empty Trash", can_empty, None);
        let refresh_item = MenuItem::new("Refresh", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let menu_ids = MenuIds {
            open: open_item.id().clone(),
            empty: empty_item.id().clone(),
            refresh: refresh_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        menu.append_items(&[
            &items_label,
            &size_label,
            &PredefinedMenuItem::separator(),
            &open_item,
            &empty_item,
            &refresh_item,
            &PredefinedMenuItem::separator(),
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(format::tooltip(&TrashState::EMPTY))
            .with_menu(Box::new(menu))
            .with_icon(Self::to_icon(initial)?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            items_label,
            size_label,
            menu_ids,
            shown: initial.clone(),
        })
    }

    /// Swap the indicator image. Re-sending the image already shown is a no-op.
    #[track_caller]
    #[instrument(skip(self, image), fields(key = ?image.key()))]
    pub fn set_image(&mut self, image: &IndicatorImage) -> AppResult<()> {
        if image.same_as(&self.shown) {
            debug!("Indicator image already shown");
            return Ok(());
        }

        self.tray_icon
            .set_icon(Some(Self::to_icon(image)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.shown = image.clone();

        Ok(())
    }

    /// Update the menu labels and tooltip from a snapshot.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_stats(&mut self, state: TrashState) -> AppResult<()> {
        self.items_label.set_text(format::items_label(&state));
        self.size_label.set_text(format::size_label(&state));

        self.tray_icon
            .set_tooltip(Some(format::tooltip(&state)))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Identifiers of the actionable menu items.
    pub fn menu_ids(&self) -> &MenuIds {
        &self.menu_ids
    }

    #[track_caller]
    fn to_icon(image: &IndicatorImage) -> AppResult<Icon> {
        Icon::from_rgba(image.rgba().to_vec(), image.width(), image.height()).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}
