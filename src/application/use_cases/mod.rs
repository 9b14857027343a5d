//! Application use cases.

mod refresh_articles_use_case;

pub use refresh_articles_use_case::RefreshArticlesUseCase;
