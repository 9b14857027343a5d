//! Infrastructure layer with adapters for the filesystem and network.

/// In-memory article store.
pub mod article_store;
/// Application configuration.
pub mod config;
/// Picture caching (disk store, memory index, batched downloads).
pub mod image;

pub use article_store::MemoryArticleStore;
pub use config::{AppConfig, CliArgs, ConfigError, ImagesConfig, LogLevel, StorageManager};
pub use image::{
    BatchHandle, BatchSummary, DiskStore, FetchCoordinator, HttpImageFetcher, IndexStats,
    MemoryIndex,
};
