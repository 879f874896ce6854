use std::fmt;

use async_trait::async_trait;
use dg_core::{GenerationRequest, LlmClient, LlmError, LlmResponse, Result, TokenUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{classify_http_error, ensure_success, http_client, parse_json_text};
use crate::Config;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_key: config.require_api_key()?,
            base_url: config.resolved_base_url()?,
            model: config.resolved_model(),
        })
    }

    fn build_request<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema.name,
                    schema: &request.schema.schema,
                    strict: false,
                },
            },
        }
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl LlmClient for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        debug!(model = %self.model, schema = %request.schema.name, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(classify_http_error)?;

        let body = ensure_success(response)
            .await?
            .json::<ChatResponse>()
            .await
            .map_err(classify_http_error)?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("completion has no message content".to_string()))?;

        let usage = body.usage.unwrap_or_default();
        Ok(LlmResponse {
            payload: parse_json_text(&text),
            raw_text: text,
            usage: TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
        })
    }
}
