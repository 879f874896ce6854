use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Response does not match schema: {0}")]
    Schema(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl Error {
    /// True when the failure is a transient provider condition worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Llm(e) if e.is_retryable())
    }
}

/// Classified failure reported by an LLM provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Unsupported(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited(_) | LlmError::Timeout(_) | LlmError::Transport(_) => true,
            LlmError::Api { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            LlmError::Malformed(_) | LlmError::Unsupported(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(LlmError::Timeout("deadline exceeded".into()).is_retryable());
        assert!(LlmError::RateLimited("429 Too Many Requests".into()).is_retryable());
        assert!(LlmError::Transport("connection reset".into()).is_retryable());
        for status in [408, 429, 500, 502, 503, 529] {
            let err = LlmError::Api { status, message: "busy".into() };
            assert!(err.is_retryable(), "status {} should be retryable", status);
        }
    }

    #[test]
    fn test_permanent_errors_are_not_retryable() {
        let auth = LlmError::Api { status: 401, message: "Unauthorized".into() };
        assert!(!auth.is_retryable());
        assert!(!LlmError::Malformed("response parsing failed".into()).is_retryable());
        assert!(!LlmError::Unsupported("something unexpected".into()).is_retryable());
    }

    #[test]
    fn test_error_wraps_llm_classification() {
        let err: Error = LlmError::Timeout("slow".into()).into();
        assert!(err.is_retryable());
        assert!(!Error::Schema("missing field".into()).is_retryable());
    }
}
