use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dg_core::{Article, ArticleStatus, ArticleStorage, Result};
use tokio::sync::RwLock;
use tracing::debug;

use super::memory::MemoryStore;
use crate::StorageBackend;

/// Articles persisted as a JSON array, rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    store: RwLock<MemoryStore>,
}

impl JsonFileStorage {
    /// Open the file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let articles: Vec<Article> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} articles from {}", articles.len(), path.display());
        Ok(Self {
            path,
            store: RwLock::new(MemoryStore::from_articles(articles)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, store: &MemoryStore) -> Result<()> {
        let json = serde_json::to_vec_pretty(store.articles())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStorage {
    fn kind(&self) -> &'static str {
        "json"
    }
}

#[async_trait]
impl ArticleStorage for JsonFileStorage {
    async fn store_article(&self, article: &Article) -> Result<()> {
        let mut store = self.store.write().await;
        store.store_article(article);
        self.persist(&store).await
    }

    async fn get_by_status(&self, status: ArticleStatus) -> Result<Vec<Article>> {
        Ok(self.store.read().await.get_by_status(status))
    }

    async fn update_status(&self, id: &str, status: ArticleStatus) -> Result<()> {
        let mut store = self.store.write().await;
        store.update_status(id, status)?;
        self.persist(&store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            url: format!("https://example.com/{}", id),
            title: format!("Article {}", id),
            author: Some("Test Author".to_string()),
            feed_name: "Test Feed".to_string(),
            feed_url: "https://example.com/feed".to_string(),
            published: Utc::now(),
            content: String::new(),
            word_count: 0,
            category: "Business".to_string(),
            summary: Some("Summary".to_string()),
            key_takeaways: vec!["Takeaway".to_string()],
            action_items: vec![],
            status: ArticleStatus::Summarized,
        }
    }

    #[tokio::test]
    async fn test_json_storage_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");

        let storage = JsonFileStorage::open(&path).await.unwrap();
        storage.store_article(&article("a")).await.unwrap();
        storage.store_article(&article("b")).await.unwrap();
        storage.update_status("b", ArticleStatus::Digested).await.unwrap();
        drop(storage);

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        let summarized = reopened.get_by_status(ArticleStatus::Summarized).await.unwrap();
        assert_eq!(summarized.len(), 1);
        assert_eq!(summarized[0].id, "a");
        assert_eq!(reopened.get_by_status(ArticleStatus::Digested).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("none.json")).await.unwrap();
        assert!(storage.get_by_status(ArticleStatus::Pending).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStorage::open(&path).await.is_err());
    }
}
