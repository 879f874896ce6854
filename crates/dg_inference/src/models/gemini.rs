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
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_json_schema: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiModel {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_key: config.require_api_key()?,
            base_url: config.resolved_base_url()?,
            model: config.resolved_model(),
        })
    }

    fn build_request<'a>(request: &'a GenerationRequest) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &request.system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: &request.schema.schema,
            },
        }
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl LlmClient for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        debug!(model = %self.model, schema = %request.schema.name, "Sending Gemini request");

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(classify_http_error)?;

        let body = ensure_success(response)
            .await?
            .json::<GenerateContentResponse>()
            .await
            .map_err(classify_http_error)?;

        let text: String = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .ok_or_else(|| LlmError::Malformed("Gemini returned no candidates".to_string()))?;

        let usage = body.usage_metadata.unwrap_or_default();
        Ok(LlmResponse {
            payload: parse_json_text(&text),
            raw_text: text,
            usage: TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count),
        })
    }
}
