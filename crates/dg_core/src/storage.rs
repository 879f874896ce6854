use async_trait::async_trait;
use crate::types::{Article, ArticleStatus};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store an article, replacing any existing record with the same id
    async fn store_article(&self, article: &Article) -> Result<()>;

    /// Get all articles currently in the given status
    async fn get_by_status(&self, status: ArticleStatus) -> Result<Vec<Article>>;

    /// Move an article to a new status
    async fn update_status(&self, id: &str, status: ArticleStatus) -> Result<()>;
}
