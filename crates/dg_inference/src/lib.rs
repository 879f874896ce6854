use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use dg_core::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub mod models;
pub mod pricing;
pub mod retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Dummy,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Dummy];

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Dummy => "dummy",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Dummy => "memory://",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Dummy => "dummy",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "dummy" => Ok(Provider::Dummy),
            other => Err(Error::Config(format!(
                "Unknown LLM provider: {}. Available providers: gemini, openai, dummy",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            api_key: None,
            model_name: None,
            base_url: None,
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn resolved_model(&self) -> String {
        self.model_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
            .to_string()
    }

    /// Base URL without a trailing slash, checked for well-formedness.
    pub fn resolved_base_url(&self) -> Result<String> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url());
        Url::parse(raw).map_err(|e| Error::Config(format!("Invalid base URL {}: {}", raw, e)))?;
        Ok(raw.trim_end_matches('/').to_string())
    }

    pub(crate) fn require_api_key(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("{} API key is required", self.provider)))
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::pricing::{ModelPricing, PricingTable};
    pub use super::retry::RetryModel;
    pub use super::{Config, Provider};
    pub use dg_core::{Error, LlmClient, LlmResponse, Result};
}

pub use models::create_model;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(" openai ".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn test_model_defaults_per_provider() {
        let config = Config {
            provider: Provider::OpenAi,
            ..Config::default()
        };
        assert_eq!(config.resolved_model(), "gpt-4o-mini");

        let config = Config {
            model_name: Some("gpt-4.1".to_string()),
            ..config
        };
        assert_eq!(config.resolved_model(), "gpt-4.1");
    }

    #[test]
    fn test_base_url_is_validated() {
        let config = Config {
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolved_base_url().unwrap(), "http://localhost:8080/v1");

        let config = Config {
            base_url: Some("not a url".to_string()),
            ..Config::default()
        };
        assert!(config.resolved_base_url().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
