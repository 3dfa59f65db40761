mod cache;
mod indicator_image;

pub use {
    cache::{EmbeddedIcons, IconCache, IconSource},
    indicator_image::{IconKey, IconOrigin, IndicatorImage},
};
