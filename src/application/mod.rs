//! Application layer with use cases orchestrating domain ports.

/// Use case implementations.
pub mod use_cases;

pub use use_cases::RefreshArticlesUseCase;
