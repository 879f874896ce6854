use std::fmt;

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::TokenUsage;
use crate::{Error, LlmError, Result};

/// A typed shape the LLM is asked to produce.
///
/// Implementors describe themselves through `JsonSchema` so providers can
/// forward the schema natively, and get one more chance to reject values
/// that deserialize fine but break a range or content constraint.
pub trait StructuredResponse: DeserializeOwned + JsonSchema {
    const NAME: &'static str;

    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Named JSON Schema with all subschemas inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn of<T: StructuredResponse>() -> Result<Self> {
        let generator = SchemaSettings::draft07()
            .with(|s| {
                s.inline_subschemas = true;
            })
            .into_generator();
        let mut schema = serde_json::to_value(generator.into_root_schema_for::<T>())?;
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
        }
        Ok(Self {
            name: T::NAME.to_string(),
            schema,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: String,
    pub schema: ResponseSchema,
}

impl GenerationRequest {
    pub fn new<T: StructuredResponse>(prompt: impl Into<String>, system: impl Into<String>) -> Result<Self> {
        Ok(Self {
            prompt: prompt.into(),
            system: system.into(),
            schema: ResponseSchema::of::<T>()?,
        })
    }
}

/// Longest slice of the raw model text quoted in error messages.
const RAW_EXCERPT_CHARS: usize = 200;

/// What a provider returned: the decoded JSON payload plus token accounting.
///
/// A reply whose text is not JSON still carries its usage; the decode
/// failure travels in `payload` so the tokens are never lost.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub payload: std::result::Result<Value, LlmError>,
    pub raw_text: String,
    pub usage: TokenUsage,
}

impl LlmResponse {
    pub fn new(parsed: Value, usage: TokenUsage) -> Self {
        let raw_text = parsed.to_string();
        Self {
            payload: Ok(parsed),
            raw_text,
            usage,
        }
    }

    /// Decode the payload into `T` and run its validation.
    pub fn parse<T: StructuredResponse>(&self) -> Result<T> {
        let parsed = self.payload.clone()?;
        let value: T = serde_json::from_value(parsed).map_err(|e| self.schema_error::<T>(e))?;
        value.validate().map_err(|e| self.schema_error::<T>(e))?;
        Ok(value)
    }

    fn schema_error<T: StructuredResponse>(&self, reason: impl fmt::Display) -> Error {
        Error::Schema(format!(
            "{}: {} (response: {})",
            T::NAME,
            reason,
            excerpt(&self.raw_text)
        ))
    }
}

/// First few hundred characters of `text`, for logs and error messages.
pub fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(RAW_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync + fmt::Debug {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Model identifier, used for pricing lookups.
    fn model(&self) -> &str;

    /// Issue one structured-generation call.
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse>;
}

/// Issue one call for `T` and decode it. Token usage is reported for every
/// response the provider returned, including ones that fail validation.
pub async fn generate_structured<T: StructuredResponse>(
    client: &dyn LlmClient,
    prompt: impl Into<String>,
    system: impl Into<String>,
) -> (Result<T>, TokenUsage) {
    let request = match GenerationRequest::new::<T>(prompt, system) {
        Ok(request) => request,
        Err(e) => return (Err(e), TokenUsage::default()),
    };
    match client.generate(&request).await {
        Ok(response) => (response.parse::<T>(), response.usage),
        Err(e) => (Err(e), TokenUsage::default()),
    }
}
