pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, LlmError, Result};
pub use models::{excerpt, generate_structured, GenerationRequest, LlmClient, LlmResponse, ResponseSchema, StructuredResponse};
pub use storage::ArticleStorage;
pub use types::{Article, ArticleStatus, CategoryDigest, DailyDigest, NonObviousInsight, TokenUsage};
