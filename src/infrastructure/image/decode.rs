//! Picture decoding on the blocking pool.

use std::sync::Arc;

use crate::domain::entities::CachedImage;
use crate::domain::errors::{CacheError, CacheResult};

/// Decodes raw bytes into a picture without blocking the async runtime.
///
/// # Errors
/// Returns a decode error if the bytes are not a supported image or the
/// decode task panicked.
pub async fn decode_image<B>(bytes: B) -> CacheResult<CachedImage>
where
    B: AsRef<[u8]> + Send + 'static,
{
    tokio::task::spawn_blocking(move || image::load_from_memory(bytes.as_ref()))
        .await
        .map_err(|e| CacheError::decode(format!("Decode task panicked: {e}")))?
        .map(Arc::new)
        .map_err(|e| CacheError::decode(format!("Failed to decode image: {e}")))
}
