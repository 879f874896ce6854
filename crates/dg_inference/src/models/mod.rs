use std::sync::Arc;

use dg_core::{excerpt, Error, LlmClient, LlmError, Result};
use serde_json::Value;
use tracing::debug;

use crate::retry::RetryModel;
use crate::{Config, Provider};

pub mod gemini;
pub mod openai;
pub mod scripted;

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;
pub use scripted::ScriptedModel;

/// Build the configured provider, wrapped with transient-error retries.
pub fn create_model(config: Config) -> Result<Arc<dyn LlmClient>> {
    let inner: Arc<dyn LlmClient> = match config.provider {
        Provider::Gemini => Arc::new(GeminiModel::new(&config)?),
        Provider::OpenAi => Arc::new(OpenAiModel::new(&config)?),
        Provider::Dummy => Arc::new(ScriptedModel::new()),
    };
    debug!("Created {} client for model {}", inner.name(), inner.model());
    Ok(Arc::new(RetryModel::new(
        inner,
        config.max_retries,
        config.retry_base_delay,
    )))
}

pub(crate) fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Map a reqwest failure onto the provider error taxonomy.
pub(crate) fn classify_http_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(e.to_string())
    } else if let Some(status) = e.status() {
        LlmError::Api {
            status: status.as_u16(),
            message: e.to_string(),
        }
    } else if e.is_decode() {
        LlmError::Malformed(e.to_string())
    } else {
        LlmError::Transport(e.to_string())
    }
}

pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };
    let err = if status.as_u16() == 429 {
        LlmError::RateLimited(message)
    } else {
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    };
    Err(err.into())
}

/// Decode the model's text output as JSON, tolerating a markdown code fence.
pub(crate) fn parse_json_text(text: &str) -> std::result::Result<Value, LlmError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    if unfenced.is_empty() {
        return Err(LlmError::Malformed("empty response text".to_string()));
    }
    serde_json::from_str(unfenced).map_err(|e| {
        LlmError::Malformed(format!(
            "response is not valid JSON: {} (response: {})",
            e,
            excerpt(unfenced)
        ))
    })
}
