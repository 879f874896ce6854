use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use dg_core::{Error, GenerationRequest, LlmClient, LlmError, LlmResponse, Result, TokenUsage};
use serde_json::Value;

/// Offline client that replays queued results in order and records every
/// request it receives. Once the queue is drained each call fails with a
/// non-retryable error, so an empty script behaves like a provider that
/// never produces usable output.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<LlmResponse>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, parsed: Value, input_tokens: u64, output_tokens: u64) -> Self {
        self.push(Ok(LlmResponse::new(parsed, TokenUsage::new(input_tokens, output_tokens))));
        self
    }

    pub fn with_error(self, error: impl Into<Error>) -> Self {
        self.push(Err(error.into()));
        self
    }

    pub fn push(&self, reply: Result<LlmResponse>) {
        lock(&self.replies).push_back(reply);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("remaining", &self.remaining())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl LlmClient for ScriptedModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    fn model(&self) -> &str {
        "dummy"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        lock(&self.requests).push(request.clone());
        lock(&self.replies).pop_front().unwrap_or_else(|| {
            Err(LlmError::Unsupported("dummy model has no scripted response".to_string()).into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::ResponseSchema;
    use serde_json::json;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            system: String::new(),
            schema: ResponseSchema {
                name: "test".to_string(),
                schema: json!({}),
            },
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_fails() {
        let model = ScriptedModel::new()
            .with_response(json!({"n": 1}), 10, 5)
            .with_error(LlmError::Timeout("slow".to_string()));

        let first = model.generate(&request("one")).await.unwrap();
        assert_eq!(first.payload, Ok(json!({"n": 1})));
        assert_eq!(first.usage, TokenUsage::new(10, 5));

        let second = model.generate(&request("two")).await.unwrap_err();
        assert!(second.is_retryable());

        let third = model.generate(&request("three")).await.unwrap_err();
        assert!(!third.is_retryable());

        let prompts: Vec<String> = model.requests().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, vec!["one", "two", "three"]);
    }
}
