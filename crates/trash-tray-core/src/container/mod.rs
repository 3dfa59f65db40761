mod location;
mod platform;
mod probe;

pub use {
    location::{TrashLayout, TrashLocation},
    platform::{SystemTrash, TrashPlatform},
    probe::{DirectoryProbe, TrashProbe},
};
