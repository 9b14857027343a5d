//! Port definition for the picture cache as seen by the application layer.

use crate::domain::entities::CachedImage;

/// Queue-then-batch access to cached pictures.
pub trait PictureCachePort: Send + Sync {
    /// Queues `url` for the next batch unless it is already cached.
    fn ensure_cached(&self, url: &str);

    /// Starts downloading everything queued so far in the background.
    fn batch_download(&self);

    /// Returns the picture for `url` if it is available right now.
    fn lookup(&self, url: &str) -> Option<CachedImage>;
}
