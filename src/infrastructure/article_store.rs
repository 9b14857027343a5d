//! In-memory article store keyed by guid.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::domain::entities::Article;
use crate::domain::ports::ArticleStorePort;

/// Article store that lives for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<String, Article>>,
}

impl MemoryArticleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored articles.
    pub fn len(&self) -> usize {
        self.articles.read().len()
    }

    /// Returns true if no article is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArticleStorePort for MemoryArticleStore {
    async fn upsert(&self, article: Article) {
        let replaced = self
            .articles
            .write()
            .insert(article.guid().to_string(), article)
            .is_some();
        trace!(replaced = replaced, "Upserted article");
    }

    async fn get_by_guid(&self, guid: &str) -> Option<Article> {
        self.articles.read().get(guid).cloned()
    }

    async fn all(&self) -> Vec<Article> {
        self.articles.read().values().cloned().collect()
    }
}
