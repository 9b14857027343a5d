//! Port definition for the article store.

use async_trait::async_trait;

use crate::domain::entities::Article;

/// Keyed article storage. Articles are identified by their guid.
#[async_trait]
pub trait ArticleStorePort: Send + Sync {
    /// Inserts the article, replacing any stored article with the same guid.
    async fn upsert(&self, article: Article);

    /// Looks up an article by guid.
    async fn get_by_guid(&self, guid: &str) -> Option<Article>;

    /// Returns every stored article in no particular order.
    async fn all(&self) -> Vec<Article>;
}
