use std::fmt;
use std::str::FromStr;

use dg_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::gate::InsightPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightsMode {
    Off,
    Auto,
    Always,
}

impl fmt::Display for InsightsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InsightsMode::Off => "off",
            InsightsMode::Auto => "auto",
            InsightsMode::Always => "always",
        };
        f.write_str(name)
    }
}

impl FromStr for InsightsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(InsightsMode::Off),
            "auto" => Ok(InsightsMode::Auto),
            "always" => Ok(InsightsMode::Always),
            other => Err(Error::Config(format!(
                "Unknown insights mode: {}. Expected one of: off, auto, always",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub insights_mode: InsightsMode,
    /// Lowest confidence (1-5) accepted in `auto` mode.
    pub insight_min_confidence: u8,
    /// Cap on cross-category insights per digest.
    pub max_insights_per_digest: usize,
    /// Category syntheses allowed in flight at once.
    pub max_concurrent_categories: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            insights_mode: InsightsMode::Auto,
            insight_min_confidence: 4,
            max_insights_per_digest: 2,
            max_concurrent_categories: 1,
        }
    }
}

impl DigestConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.insight_min_confidence) {
            return Err(Error::Config(format!(
                "insight_min_confidence must be between 1 and 5, got {}",
                self.insight_min_confidence
            )));
        }
        if self.max_concurrent_categories == 0 {
            return Err(Error::Config(
                "max_concurrent_categories must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn insight_policy(&self) -> InsightPolicy {
        match self.insights_mode {
            InsightsMode::Off => InsightPolicy::Off,
            InsightsMode::Auto => InsightPolicy::Auto {
                min_confidence: self.insight_min_confidence,
            },
            InsightsMode::Always => InsightPolicy::Always,
        }
    }
}
