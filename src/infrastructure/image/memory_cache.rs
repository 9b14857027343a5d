//! In-memory index of decoded pictures.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::decode::decode_image;
use super::disk_cache::DiskStore;
use crate::domain::entities::{CacheKey, CachedImage};

/// Decoded pictures keyed by [`CacheKey`].
///
/// Every operation takes the internal lock for the map access only; decoding
/// and I/O always happen outside it. Entries are never replaced or removed.
#[derive(Default)]
pub struct MemoryIndex {
    entries: Mutex<HashMap<CacheKey, CachedImage>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a picture is stored under `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Returns the picture stored under `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<CachedImage> {
        let found = self.entries.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory index hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory index miss");
        }
        found
    }

    /// Stores a picture under `key` unless one is already there.
    ///
    /// Returns false and keeps the existing picture when `key` is taken.
    pub fn insert(&self, key: CacheKey, image: CachedImage) -> bool {
        match self.entries.lock().entry(key) {
            Entry::Occupied(slot) => {
                trace!(key = %slot.key(), "Picture already indexed, keeping first");
                false
            }
            Entry::Vacant(slot) => {
                debug!(key = %slot.key(), "Storing picture in memory index");
                slot.insert(image);
                true
            }
        }
    }

    /// Returns the number of stored pictures.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes every file in `disk` into the index.
    ///
    /// Files that fail to decode are skipped. Returns the number of pictures
    /// loaded.
    pub async fn hydrate(&self, disk: &DiskStore) -> usize {
        let mut blobs = pin!(disk.load_all());
        let mut loaded = 0usize;
        let mut skipped = 0usize;

        while let Some((key, bytes)) = blobs.next().await {
            match decode_image(bytes).await {
                Ok(image) => {
                    if self.insert(key, image) {
                        loaded += 1;
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping undecodable cache file");
                    skipped += 1;
                }
            }
        }

        info!(
            loaded = loaded,
            skipped = skipped,
            path = %disk.cache_dir().display(),
            "Hydrated memory index from disk"
        );
        loaded
    }

    /// Returns lookup statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> IndexStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        IndexStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }
}

/// Statistics about index lookups.
#[derive(Debug, Clone)]
pub struct IndexStats {
    /// Number of lookups that found a picture.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of stored pictures.
    pub size: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Index: {} pictures, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::ports::mocks::png_bytes;

    fn picture(width: u32) -> CachedImage {
        Arc::new(image::DynamicImage::new_rgb8(width, 1))
    }

    #[test]
    fn test_insert_and_get() {
        let index = MemoryIndex::new();
        let key = CacheKey::from_url("http://x/a.jpg");

        index.insert(key.clone(), picture(100));

        assert!(index.contains(&key));
        assert_eq!(index.get(&key).unwrap().width(), 100);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_keeps_first_entry() {
        let index = MemoryIndex::new();
        let key = CacheKey::from_url("http://x/a.jpg");
        let first = picture(100);

        assert!(index.insert(key.clone(), first.clone()));
        assert!(!index.insert(key.clone(), picture(200)));

        let stored = index.get(&key).unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(stored.width(), 100);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_miss() {
        let index = MemoryIndex::new();
        let key = CacheKey::from_url("http://x/missing.jpg");

        assert!(!index.contains(&key));
        assert!(index.get(&key).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_stats() {
        let index = MemoryIndex::new();
        let key = CacheKey::from_url("http://x/a.jpg");
        index.insert(key.clone(), picture(10));

        let _ = index.get(&key);
        let _ = index.get(&CacheKey::from_url("http://x/b.jpg"));

        let stats = index.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_concurrent_readers_see_whole_entries() {
        let index = Arc::new(MemoryIndex::new());
        let keys: Vec<_> = (0..64)
            .map(|i| CacheKey::from_url(&format!("http://x/{i}.jpg")))
            .collect();

        let writer = {
            let index = index.clone();
            let keys = keys.clone();
            std::thread::spawn(move || {
                for (i, key) in keys.into_iter().enumerate() {
                    index.insert(key, picture(u32::try_from(i).unwrap() + 1));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                let keys = keys.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        for (i, key) in keys.iter().enumerate() {
                            if let Some(img) = index.get(key) {
                                assert_eq!(img.width(), u32::try_from(i).unwrap() + 1);
                            }
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(index.len(), keys.len());
    }

    #[tokio::test]
    async fn test_hydrate_loads_decodable_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let disk = DiskStore::open(temp.path().to_path_buf()).await.unwrap();
        let good = CacheKey::from_url("http://x/good.png");
        let bad = CacheKey::from_url("http://x/bad.png");
        disk.write(&good, &png_bytes(4, 3)).await.unwrap();
        disk.write(&bad, b"corrupt").await.unwrap();

        let index = MemoryIndex::new();
        let loaded = index.hydrate(&disk).await;

        assert_eq!(loaded, 1);
        assert_eq!(index.get(&good).unwrap().height(), 3);
        assert!(!index.contains(&bad));
    }

    #[tokio::test]
    async fn test_hydrate_empty_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let disk = DiskStore::open(temp.path().to_path_buf()).await.unwrap();

        let index = MemoryIndex::new();

        assert_eq!(index.hydrate(&disk).await, 0);
        assert!(index.is_empty());
    }
}
