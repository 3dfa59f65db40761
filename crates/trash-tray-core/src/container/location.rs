use std::path::{Path, PathBuf};

/// On-disk arrangement of a trash container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashLayout {
    /// Every entry of the root is one trashed item (freedesktop `Trash/files`).
    Flat,
    /// Like `Flat`, but Finder bookkeeping files are not items (`~/.Trash`).
    Finder,
    /// Per-user subdirectories holding `$R…` content and `$I…` metadata pairs.
    RecycleBin,
}

impl TrashLayout {
    /// Layout used by the current platform's trash.
    pub fn native() -> Self {
        if cfg!(windows) {
            TrashLayout::RecycleBin
        } else if cfg!(target_os = "macos") {
            TrashLayout::Finder
        } else {
            TrashLayout::Flat
        }
    }

    /// Whether a file name in the trash counts as a trashed item.
    pub fn is_item(self, name: &str) -> bool {
        match self {
            TrashLayout::Flat => true,
            TrashLayout::Finder => name != ".DS_Store" && name != ".localized",
            TrashLayout::RecycleBin => {
                !name.eq_ignore_ascii_case("desktop.ini") && name.starts_with("$R")
            }
        }
    }
}

/// The directory backing the trash container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashLocation {
    path: PathBuf,
    layout: TrashLayout,
    native: bool,
}

impl TrashLocation {
    /// A plain directory with an explicit path and layout. It is not the
    /// desktop's own trash, so emptying it deletes its items directly.
    pub fn new(path: impl Into<PathBuf>, layout: TrashLayout) -> Self {
        Self {
            path: path.into(),
            layout,
            native: false,
        }
    }

    /// Resolve the trash directory for this platform.
    ///
    /// An override path keeps the native layout. Returns `None` only when no
    /// home or data directory can be determined.
    pub fn resolve(override_path: Option<&Path>) -> Option<Self> {
        let layout = TrashLayout::native();
        if let Some(path) = override_path {
            return Some(Self::new(path, layout));
        }
        native_trash_dir().map(|path| Self {
            native: true,
            ..Self::new(path, layout)
        })
    }

    /// Directory probed and watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How items are arranged below [`TrashLocation::path`].
    pub fn layout(&self) -> TrashLayout {
        self.layout
    }

    /// Whether this is the desktop's own trash rather than a configured
    /// directory.
    pub fn is_native(&self) -> bool {
        self.native
    }

    /// Whether the directory currently exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

#[cfg(windows)]
fn native_trash_dir() -> Option<PathBuf> {
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    Some(PathBuf::from(format!("{drive}\\$Recycle.Bin")))
}

#[cfg(target_os = "macos")]
fn native_trash_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".Trash"))
}

#[cfg(not(any(windows, target_os = "macos")))]
fn native_trash_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|data| data.join("Trash").join("files"))
}
