//! Disk-backed picture store that persists raw bytes across sessions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{self, Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::domain::errors::{CacheError, CacheResult};

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Flat directory holding one file per cache key.
///
/// File names are the keys themselves and contents are the bytes exactly as
/// downloaded. There is no manifest and nothing is ever evicted.
#[derive(Debug, Clone)]
pub struct DiskStore {
    cache_dir: PathBuf,
}

impl DiskStore {
    /// Opens the store rooted at `cache_dir`, creating the directory if needed.
    ///
    /// Temporaries left behind by an interrupted write are deleted.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created.
    pub async fn open(cache_dir: impl Into<PathBuf>) -> CacheResult<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::io(format!("Failed to create cache dir: {e}")))?;
        let removed = remove_partials(&cache_dir).await;
        debug!(
            path = %cache_dir.display(),
            removed_partials = removed,
            "Opened picture cache directory"
        );
        Ok(Self { cache_dir })
    }

    /// Opens the store in the default location (`<platform cache dir>/images`).
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created.
    pub async fn default_location() -> CacheResult<Self> {
        Self::open(default_cache_path()).await
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the file that holds `key`.
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.as_str())
    }

    /// Creates or overwrites the file for `key`.
    ///
    /// Bytes land in a hidden temporary first and are renamed into place, so
    /// a reader never sees a partially written file.
    ///
    /// # Errors
    /// Returns error if the file cannot be created, written or moved into place.
    pub async fn write(&self, key: &CacheKey, bytes: &[u8]) -> CacheResult<()> {
        let path = self.path_for(key);
        let part = self.cache_dir.join(format!(
            ".{key}.{}.part",
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_file(&part, bytes).await {
            let _ = fs::remove_file(&part).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&part, &path).await {
            let _ = fs::remove_file(&part).await;
            return Err(CacheError::io(format!(
                "Failed to move cache file into place: {e}"
            )));
        }

        debug!(key = %key, path = %path.display(), size = bytes.len(), "Stored picture on disk");
        Ok(())
    }

    /// Lazily yields `(key, bytes)` for every regular file in the directory.
    ///
    /// Each call re-reads the directory. Unreadable entries are skipped, as
    /// are hidden in-progress writes and subdirectories.
    pub fn load_all(&self) -> impl Stream<Item = (CacheKey, Vec<u8>)> + Send + 'static {
        let cache_dir = self.cache_dir.clone();

        stream::once(async move {
            match fs::read_dir(&cache_dir).await {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(path = %cache_dir.display(), error = %e, "Failed to read cache dir");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .flat_map(|entries| {
            stream::unfold(entries, |mut entries| async move {
                loop {
                    match entries.next_entry().await {
                        Ok(Some(entry)) => {
                            if let Some(item) = read_entry(&entry).await {
                                return Some((item, entries));
                            }
                        }
                        Ok(None) => return None,
                        Err(e) => {
                            warn!(error = %e, "Failed to enumerate cache dir");
                            return None;
                        }
                    }
                }
            })
        })
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> CacheResult<()> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| CacheError::io(format!("Failed to create cache file: {e}")))?;

    file.write_all(bytes)
        .await
        .map_err(|e| CacheError::io(format!("Failed to write cache file: {e}")))?;

    file.flush()
        .await
        .map_err(|e| CacheError::io(format!("Failed to flush cache file: {e}")))
}

fn is_partial(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".part")
}

async fn remove_partials(cache_dir: &Path) -> usize {
    let mut entries = match fs::read_dir(cache_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %cache_dir.display(), error = %e, "Failed to scan cache dir");
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_str().is_some_and(is_partial) {
            continue;
        }
        let path = entry.path();
        match fs::remove_file(&path).await {
            Ok(()) => {
                trace!(path = %path.display(), "Removed stale partial write");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial write"),
        }
    }
    removed
}

async fn read_entry(entry: &fs::DirEntry) -> Option<(CacheKey, Vec<u8>)> {
    let path = entry.path();

    match entry.file_type().await {
        Ok(kind) if kind.is_file() => {}
        Ok(_) => {
            trace!(path = %path.display(), "Skipping non-file cache entry");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to stat cache entry");
            return None;
        }
    }

    let name = entry.file_name();
    let Some(key) = name.to_str().and_then(CacheKey::from_file_name) else {
        trace!(path = %path.display(), "Skipping cache entry with foreign name");
        return None;
    };

    match fs::read(&path).await {
        Ok(bytes) => Some((key, bytes)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read cache file");
            None
        }
    }
}

/// Returns the default cache directory path.
fn default_cache_path() -> PathBuf {
    directories::ProjectDirs::from("com", "linuxmobile", "newsreel").map_or_else(
        || {
            std::env::temp_dir()
                .join("newsreel")
                .join("cache")
                .join("images")
        },
        |dirs| dirs.cache_dir().join("images"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (DiskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::open(temp_dir.path().to_path_buf())
            .await
            .unwrap();
        (store, temp_dir)
    }

    async fn collect(store: &DiskStore) -> Vec<(CacheKey, Vec<u8>)> {
        let mut items: Vec<_> = store.load_all().collect().await;
        items.sort();
        items
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let store = DiskStore::open(nested.clone()).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.cache_dir(), nested.as_path());
    }

    #[tokio::test]
    async fn test_write_names_file_by_key() {
        let (store, temp) = create_test_store().await;
        let key = CacheKey::from_url("http://x/a.jpg");

        store.write(&key, b"raw bytes").await.unwrap();

        let on_disk = std::fs::read(temp.path().join(key.as_str())).unwrap();
        assert_eq!(on_disk, b"raw bytes");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (store, _temp) = create_test_store().await;
        let key = CacheKey::from_url("http://x/a.jpg");

        store.write(&key, b"first").await.unwrap();
        store.write(&key, b"second").await.unwrap();

        assert_eq!(collect(&store).await, vec![(key, b"second".to_vec())]);
    }

    #[tokio::test]
    async fn test_write_leaves_no_temporaries() {
        let (store, temp) = create_test_store().await;
        store
            .write(&CacheKey::from_url("http://x/a.jpg"), b"data")
            .await
            .unwrap();

        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_write_fails_when_directory_is_gone() {
        let (store, temp) = create_test_store().await;
        std::fs::remove_dir_all(temp.path()).unwrap();

        let result = store
            .write(&CacheKey::from_url("http://x/a.jpg"), b"data")
            .await;

        assert!(matches!(result, Err(CacheError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_all_yields_every_file() {
        let (store, _temp) = create_test_store().await;
        let a = CacheKey::from_url("http://x/a.jpg");
        let b = CacheKey::from_url("http://x/b.jpg");
        store.write(&a, b"aaa").await.unwrap();
        store.write(&b, b"bbb").await.unwrap();

        let mut expected = vec![(a, b"aaa".to_vec()), (b, b"bbb".to_vec())];
        expected.sort();
        assert_eq!(collect(&store).await, expected);
    }

    #[tokio::test]
    async fn test_load_all_is_restartable() {
        let (store, _temp) = create_test_store().await;
        store
            .write(&CacheKey::from_url("http://x/a.jpg"), b"aaa")
            .await
            .unwrap();

        assert_eq!(collect(&store).await.len(), 1);
        assert_eq!(collect(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_all_skips_partials_and_directories() {
        let (store, temp) = create_test_store().await;
        let key = CacheKey::from_url("http://x/a.jpg");
        store.write(&key, b"aaa").await.unwrap();
        std::fs::write(temp.path().join(format!(".{key}.7.part")), b"half").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        assert_eq!(collect(&store).await, vec![(key, b"aaa".to_vec())]);
    }

    #[tokio::test]
    async fn test_open_removes_stale_partials() {
        let (store, temp) = create_test_store().await;
        let key = CacheKey::from_url("http://x/a.jpg");
        store.write(&key, b"aaa").await.unwrap();
        let stale = temp.path().join(format!(".{key}.3.part"));
        std::fs::write(&stale, b"half").unwrap();
        std::fs::write(temp.path().join(".keep"), b"").unwrap();

        let reopened = DiskStore::open(temp.path().to_path_buf()).await.unwrap();

        assert!(!stale.exists());
        assert!(temp.path().join(".keep").exists());
        assert_eq!(collect(&reopened).await, vec![(key, b"aaa".to_vec())]);
    }

    #[tokio::test]
    async fn test_load_all_missing_directory_is_empty() {
        let (store, temp) = create_test_store().await;
        std::fs::remove_dir_all(temp.path()).unwrap();

        assert!(collect(&store).await.is_empty());
    }
}
