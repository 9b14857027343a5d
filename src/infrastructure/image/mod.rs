//! Picture caching infrastructure.
//!
//! This module provides:
//! - A flat on-disk store that survives restarts
//! - An in-memory index of decoded pictures
//! - Batched, deduplicated downloads with a completion callback

pub mod decode;
pub mod disk_cache;
pub mod http_fetcher;
pub mod loader;
pub mod memory_cache;

pub use decode::decode_image;
pub use disk_cache::DiskStore;
pub use http_fetcher::HttpImageFetcher;
pub use loader::{BatchHandle, BatchSummary, FetchCoordinator};
pub use memory_cache::{IndexStats, MemoryIndex};
