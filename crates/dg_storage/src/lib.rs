use std::sync::Arc;

use dg_core::{ArticleStorage, Error, Result};

pub mod backends;

pub use backends::*;

pub trait StorageBackend: ArticleStorage {
    /// Short backend name, for logs.
    fn kind(&self) -> &'static str;
}

/// Open an article store by backend name.
pub async fn create_storage(kind: &str, path: Option<&str>) -> Result<Arc<dyn StorageBackend>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "json" => {
            let path = path.ok_or_else(|| {
                Error::Config("The json storage backend requires a store path".to_string())
            })?;
            Ok(Arc::new(JsonFileStorage::open(path).await?))
        }
        other => Err(Error::Config(format!(
            "Unknown storage backend: {}. Available backends: memory, json",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
