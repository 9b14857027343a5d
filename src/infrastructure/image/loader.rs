//! Batched picture downloads feeding the two-tier cache.
//!
//! Callers queue URLs with [`FetchCoordinator::ensure_cached`] and start one
//! background job per [`FetchCoordinator::batch_download`]. Each job fetches
//! its captured URLs, persists them to disk, decodes them into the memory
//! index and then notifies the listener once.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, trace, warn};

use crate::domain::entities::{CacheKey, CachedImage};
use crate::domain::errors::CacheResult;
use crate::domain::ports::{BatchListener, ImageFetcherPort, PictureCachePort};
use crate::infrastructure::config::ImagesConfig;

use super::decode::decode_image;
use super::disk_cache::DiskStore;
use super::memory_cache::MemoryIndex;

/// Coordinates picture fetches for one cache directory.
///
/// Construct it once per process and share it by `Arc`.
pub struct FetchCoordinator {
    pipeline: Arc<Pipeline>,
    listener: Arc<dyn BatchListener>,
    pending: Mutex<HashSet<String>>,
    next_batch: AtomicU64,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("cache_dir", &self.pipeline.disk.cache_dir())
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// Everything a per-picture task needs.
struct Pipeline {
    index: Arc<MemoryIndex>,
    disk: DiskStore,
    fetcher: Arc<dyn ImageFetcherPort>,
    semaphore: Semaphore,
}

impl FetchCoordinator {
    /// Creates a coordinator over an already populated index.
    #[must_use]
    pub fn new(
        config: &ImagesConfig,
        disk: DiskStore,
        index: Arc<MemoryIndex>,
        fetcher: Arc<dyn ImageFetcherPort>,
        listener: Arc<dyn BatchListener>,
    ) -> Self {
        let pipeline = Pipeline {
            index,
            disk,
            fetcher,
            semaphore: Semaphore::new(config.max_concurrent_downloads.max(1)),
        };

        Self {
            pipeline: Arc::new(pipeline),
            listener,
            pending: Mutex::new(HashSet::new()),
            next_batch: AtomicU64::new(1),
        }
    }

    /// Creates a coordinator and hydrates its index from `disk`.
    ///
    /// No network access happens here; pictures already on disk become
    /// available to [`lookup`](Self::lookup) immediately.
    pub async fn initialize(
        config: &ImagesConfig,
        disk: DiskStore,
        fetcher: Arc<dyn ImageFetcherPort>,
        listener: Arc<dyn BatchListener>,
    ) -> Self {
        let index = Arc::new(MemoryIndex::new());
        index.hydrate(&disk).await;
        Self::new(config, disk, index, fetcher, listener)
    }

    /// Queues `url` for the next batch unless its picture is already indexed.
    ///
    /// Never blocks on I/O. Queuing the same URL twice is a no-op.
    pub fn ensure_cached(&self, url: &str) {
        let key = CacheKey::from_url(url);
        // A batch in flight may index this key right after the check, which
        // only costs a redundant download in the next batch.
        if self.pipeline.index.contains(&key) {
            trace!(url = %url, "Picture already cached");
            return;
        }

        if self.pending.lock().insert(url.to_string()) {
            trace!(url = %url, key = %key, "Queued picture for next batch");
        }
    }

    /// Starts a background job for every URL queued so far.
    ///
    /// The pending set is emptied before the job starts. A job is spawned and
    /// the listener notified even when nothing was queued. Dropping the
    /// returned handle does not cancel the job.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn batch_download(&self) -> BatchHandle {
        let urls: Vec<String> = std::mem::take(&mut *self.pending.lock())
            .into_iter()
            .collect();
        let id = self.next_batch.fetch_add(1, Ordering::Relaxed);

        info!(batch = id, count = urls.len(), "Starting batch download");

        let job = BatchJob {
            id,
            urls,
            pipeline: self.pipeline.clone(),
            listener: self.listener.clone(),
        };

        BatchHandle {
            id,
            handle: tokio::spawn(job.run()),
        }
    }

    /// Returns the cached picture for `url` without blocking on I/O.
    pub fn lookup(&self, url: &str) -> Option<CachedImage> {
        self.pipeline.index.get(&CacheKey::from_url(url))
    }

    /// Returns the number of URLs waiting for the next batch.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns the memory index shared with running batches.
    #[must_use]
    pub fn index(&self) -> &Arc<MemoryIndex> {
        &self.pipeline.index
    }

    /// Returns the disk store pictures are persisted to.
    #[must_use]
    pub fn disk(&self) -> &DiskStore {
        &self.pipeline.disk
    }
}

impl PictureCachePort for FetchCoordinator {
    fn ensure_cached(&self, url: &str) {
        Self::ensure_cached(self, url);
    }

    fn batch_download(&self) {
        let _ = Self::batch_download(self);
    }

    fn lookup(&self, url: &str) -> Option<CachedImage> {
        Self::lookup(self, url)
    }
}

/// Outcome counts for one finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batch sequence number, starting at 1.
    pub id: u64,
    /// URLs captured by the batch.
    pub attempted: usize,
    /// URLs that ended up in the memory index.
    pub cached: usize,
    /// URLs skipped because a step failed.
    pub failed: usize,
}

/// Handle to a running batch job.
#[derive(Debug)]
pub struct BatchHandle {
    id: u64,
    handle: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Returns the batch sequence number.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns true once the job, including its notification, has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job to finish.
    ///
    /// Returns `None` only if the job itself panicked.
    pub async fn join(self) -> Option<BatchSummary> {
        match self.handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!(batch = self.id, error = %e, "Batch job panicked");
                None
            }
        }
    }
}

struct BatchJob {
    id: u64,
    urls: Vec<String>,
    pipeline: Arc<Pipeline>,
    listener: Arc<dyn BatchListener>,
}

impl BatchJob {
    async fn run(self) -> BatchSummary {
        let mut summary = BatchSummary {
            id: self.id,
            attempted: self.urls.len(),
            ..BatchSummary::default()
        };

        let mut tasks = JoinSet::new();
        for url in self.urls {
            let pipeline = self.pipeline.clone();
            tasks.spawn(async move {
                match pipeline.cache_one(&url).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to cache picture");
                        false
                    }
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(true) => summary.cached += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    error!(batch = self.id, error = %e, "Picture task panicked");
                    summary.failed += 1;
                }
            }
        }

        info!(
            batch = summary.id,
            attempted = summary.attempted,
            cached = summary.cached,
            failed = summary.failed,
            "Batch download complete"
        );

        self.listener.on_batch_complete();
        summary
    }
}

impl Pipeline {
    async fn cache_one(&self, url: &str) -> CacheResult<()> {
        let _permit = self.semaphore.acquire().await.ok();
        let key = CacheKey::from_url(url);

        let bytes = self.fetcher.fetch(url).await?;
        self.disk.write(&key, &bytes).await?;
        let image = decode_image(bytes).await?;

        debug!(
            url = %url,
            key = %key,
            width = image.width(),
            height = image.height(),
            "Picture cached"
        );
        self.index.insert(key, image);
        Ok(())
    }
}
