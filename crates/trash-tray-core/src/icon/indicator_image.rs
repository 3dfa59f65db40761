use crate::{CoreError, CoreResult, IndicatorTheme};

use std::{fmt, panic::Location, sync::Arc};

use error_location::ErrorLocation;

/// Size of the generated fallback glyph.
const FALLBACK_SIZE: u32 = 16;

/// Cache key: one entry per (state, theme) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconKey {
    /// Whether the image depicts an empty trash.
    pub is_empty: bool,
    /// Theme variant.
    pub theme: IndicatorTheme,
}

impl IconKey {
    /// Create a key.
    pub fn new(is_empty: bool, theme: IndicatorTheme) -> Self {
        Self { is_empty, theme }
    }

    pub(crate) fn slot(self) -> usize {
        let state = usize::from(!self.is_empty) * 2;
        let theme = match self.theme {
            IndicatorTheme::Light => 0,
            IndicatorTheme::Dark => 1,
        };
        state + theme
    }
}

/// Where an image's pixels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconOrigin {
    /// Decoded from the embedded PNG resources.
    Embedded,
    /// Generated because the resource was missing or undecodable.
    Fallback,
}

struct Pixels {
    key: IconKey,
    origin: IconOrigin,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

/// Shared, immutable RGBA image shown by the indicator.
///
/// Clones share the same pixel buffer; use [`IndicatorImage::same_as`] to
/// compare identity.
#[derive(Clone)]
pub struct IndicatorImage(Arc<Pixels>);

impl IndicatorImage {
    /// Decode a PNG into an indicator image.
    #[track_caller]
    pub fn decode(key: IconKey, png_bytes: &[u8]) -> CoreResult<Self> {
        let img = image::load_from_memory(png_bytes).map_err(|e| CoreError::IconDecodeFailed {
            reason: format!("{key:?}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Ok(Self(Arc::new(Pixels {
            key,
            origin: IconOrigin::Embedded,
            rgba: rgba.into_raw(),
            width,
            height,
        })))
    }

    /// Plain square glyph used when a resource cannot be loaded.
    ///
    /// Filled for a full trash, hollow for an empty one, so the state stays
    /// readable even without artwork.
    pub fn fallback(key: IconKey) -> Self {
        let ink: [u8; 4] = match key.theme {
            IndicatorTheme::Light => [48, 48, 48, 255],
            IndicatorTheme::Dark => [224, 224, 224, 255],
        };
        let last = FALLBACK_SIZE - 1;
        let mut rgba = Vec::with_capacity((FALLBACK_SIZE * FALLBACK_SIZE * 4) as usize);
        for y in 0..FALLBACK_SIZE {
            for x in 0..FALLBACK_SIZE {
                let border = x == 0 || y == 0 || x == last || y == last;
                let px = if border || !key.is_empty { ink } else { [0; 4] };
                rgba.extend_from_slice(&px);
            }
        }

        Self(Arc::new(Pixels {
            key,
            origin: IconOrigin::Fallback,
            rgba,
            width: FALLBACK_SIZE,
            height: FALLBACK_SIZE,
        }))
    }

    /// Key this image was produced for.
    pub fn key(&self) -> IconKey {
        self.0.key
    }

    /// Whether the image is embedded artwork or a generated fallback.
    pub fn origin(&self) -> IconOrigin {
        self.0.origin
    }

    /// Raw RGBA8 pixels, row-major.
    pub fn rgba(&self) -> &[u8] {
        &self.0.rgba
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Identity comparison: true when both handles share one buffer.
    pub fn same_as(&self, other: &IndicatorImage) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for IndicatorImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorImage")
            .field("key", &self.0.key)
            .field("origin", &self.0.origin)
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .finish()
    }
}
