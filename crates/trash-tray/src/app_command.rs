use tray_icon::menu::MenuId;

/// User commands raised from the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Open the desktop's trash view.
    OpenTrash,
    /// Permanently delete everything in the trash.
    EmptyTrash,
    /// Re-enumerate the trash and report its size.
    Refresh,
    /// Request application shutdown.
    Exit,
}

/// Menu item identifiers for the actionable entries.
#[derive(Debug, Clone)]
pub struct MenuIds {
    pub(crate) open: MenuId,
    pub(crate) empty: MenuId,
    pub(crate) refresh: MenuId,
    pub(crate) exit: MenuId,
}

impl MenuIds {
    /// Command bound to a clicked menu item, if any.
    pub fn command_for(&self, id: &MenuId) -> Option<AppCommand> {
        if *id == self.open {
            Some(AppCommand::OpenTrash)
        } else if *id == self.empty {
            Some(AppCommand::EmptyTrash)
        } else if *id == self.refresh {
            Some(AppCommand::Refresh)
        } else if *id == self.exit {
            Some(AppCommand::Exit)
        } else {
            None
        }
    }
}
