use async_trait::async_trait;
use dg_core::{Article, ArticleStatus, ArticleStorage, Error, Result};
use tokio::sync::RwLock;

use crate::StorageBackend;

/// Article records in insertion order, upserted by id.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub(crate) fn from_articles(articles: Vec<Article>) -> Self {
        let mut store = Self::default();
        for article in articles {
            store.store_article(&article);
        }
        store
    }

    pub(crate) fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub(crate) fn store_article(&mut self, article: &Article) {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article.clone();
        } else {
            self.articles.push(article.clone());
        }
    }

    pub(crate) fn get_by_status(&self, status: ArticleStatus) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|article| article.status == status)
            .cloned()
            .collect()
    }

    pub(crate) fn update_status(&mut self, id: &str, status: ArticleStatus) -> Result<()> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::Storage(format!("Article not found: {}", id)))?;
        article.status = status;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: RwLock<MemoryStore>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            store: RwLock::new(MemoryStore::from_articles(articles)),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn store_article(&self, article: &Article) -> Result<()> {
        self.store.write().await.store_article(article);
        Ok(())
    }

    async fn get_by_status(&self, status: ArticleStatus) -> Result<Vec<Article>> {
        Ok(self.store.read().await.get_by_status(status))
    }

    async fn update_status(&self, id: &str, status: ArticleStatus) -> Result<()> {
        self.store.write().await.update_status(id, status)
    }
}
