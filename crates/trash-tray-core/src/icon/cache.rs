//! Memoized (state × theme) → image lookup.
//!
//! One owned cache is built at startup and shared by handle. Entries are
//! loaded on first use and kept until the cache itself is dropped; callers
//! receive shared handles and never free the underlying pixels.

use crate::{IconKey, IndicatorImage, IndicatorTheme};

use std::sync::OnceLock;

use tracing::{debug, warn};

/// Supplies encoded PNG bytes for each icon key.
pub trait IconSource: Send + Sync {
    /// PNG bytes for `key`, or `None` when the resource is missing.
    fn png_bytes(&self, key: IconKey) -> Option<&[u8]>;
}

/// Artwork compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedIcons;

impl IconSource for EmbeddedIcons {
    fn png_bytes(&self, key: IconKey) -> Option<&[u8]> {
        let bytes: &'static [u8] = match (key.is_empty, key.theme) {
            (true, IndicatorTheme::Light) => include_bytes!("../../resources/icons/empty_light.png"),
            (true, IndicatorTheme::Dark) => include_bytes!("../../resources/icons/empty_dark.png"),
            (false, IndicatorTheme::Light) => include_bytes!("../../resources/icons/full_light.png"),
            (false, IndicatorTheme::Dark) => include_bytes!("../../resources/icons/full_dark.png"),
        };
        Some(bytes)
    }
}

/// Process-lifetime icon cache with four slots.
pub struct IconCache {
    source: Box<dyn IconSource>,
    slots: [OnceLock<IndicatorImage>; 4],
}

impl IconCache {
    /// Cache over the embedded artwork.
    pub fn embedded() -> Self {
        Self::with_source(EmbeddedIcons)
    }

    /// Cache over a custom source.
    pub fn with_source(source: impl IconSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: Default::default(),
        }
    }

    /// Image for the given state and theme.
    ///
    /// The first call per key decodes the resource; later calls return the
    /// same shared instance. A missing or corrupt resource yields a generated
    /// fallback, which is then cached like any other entry.
    pub fn get(&self, is_empty: bool, theme: IndicatorTheme) -> IndicatorImage {
        let key = IconKey::new(is_empty, theme);
        self.slots[key.slot()]
            .get_or_init(|| self.load(key))
            .clone()
    }

    /// Whether `key` has been loaded already.
    pub fn is_loaded(&self, key: IconKey) -> bool {
        self.slots[key.slot()].get().is_some()
    }

    fn load(&self, key: IconKey) -> IndicatorImage {
        let Some(bytes) = self.source.png_bytes(key) else {
            warn!(?key, "Indicator image missing, using fallback");
            return IndicatorImage::fallback(key);
        };

        match IndicatorImage::decode(key, bytes) {
            Ok(image) => {
                debug!(?key, width = image.width(), height = image.height(), "Indicator image loaded");
                image
            }
            Err(e) => {
                warn!(?key, error = %e, "Indicator image undecodable, using fallback");
                IndicatorImage::fallback(key)
            }
        }
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::embedded()
    }
}
