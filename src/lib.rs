//! Newsreel - a news feed reader with a durable thumbnail cache.
//!
//! The heart of the crate is the picture cache: URLs are hashed into stable
//! keys, pictures are persisted to a flat cache directory, decoded into an
//! in-memory index and downloaded in deduplicated background batches.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for the filesystem and network.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "newsreel";
