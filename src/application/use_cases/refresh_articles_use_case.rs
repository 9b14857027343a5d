//! Refresh use case: store freshly parsed articles and queue their pictures.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::{Article, sort_newest_first};
use crate::domain::ports::{ArticleStorePort, PictureCachePort};

/// Merges a freshly fetched article list into the store and schedules one
/// picture batch for it.
#[derive(Clone)]
pub struct RefreshArticlesUseCase {
    pictures: Arc<dyn PictureCachePort>,
    store: Arc<dyn ArticleStorePort>,
}

impl RefreshArticlesUseCase {
    /// Creates new refresh use case.
    #[must_use]
    pub const fn new(
        pictures: Arc<dyn PictureCachePort>,
        store: Arc<dyn ArticleStorePort>,
    ) -> Self {
        Self { pictures, store }
    }

    /// Queues every article picture, starts one batch, upserts the articles
    /// and returns the whole stored list newest first.
    ///
    /// Pictures arrive in the background; listeners learn about them from the
    /// batch notification.
    pub async fn execute(&self, fresh: Vec<Article>) -> Vec<Article> {
        debug!(count = fresh.len(), "Refreshing articles");

        for article in &fresh {
            self.pictures.ensure_cached(article.picture_url());
        }
        self.pictures.batch_download();

        for article in fresh {
            self.store.upsert(article).await;
        }

        let mut articles = self.store.all().await;
        sort_newest_first(&mut articles);

        info!(total = articles.len(), "Articles refreshed");
        articles
    }
}
