//! Domain entity definitions.

mod article;
mod image;

pub use article::{Article, FALLBACK_PICTURE_URL, sort_newest_first};
pub use image::{CacheKey, CachedImage};
