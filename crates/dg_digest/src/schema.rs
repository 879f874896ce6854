//! Response shapes requested from the LLM.

use dg_core::StructuredResponse;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// A candidate finding, before gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightCandidate {
    /// One-sentence finding that is not obvious at first glance
    pub insight: String,
    /// One sentence explaining why the finding is unintuitive
    pub why_unintuitive: String,
    /// Confidence from 1 (speculative) to 5 (well supported)
    #[serde(deserialize_with = "whole_number")]
    #[schemars(with = "u8")]
    #[schemars(range(min = 1, max = 5))]
    pub confidence: u8,
    /// Source URLs backing the insight, taken from the provided articles
    #[serde(default)]
    pub supporting_urls: Vec<String>,
}

/// Accept `4` and `4.0` alike; reject fractions and values outside `u8`.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(serde::de::Error::custom(format!(
            "confidence must be a whole number, got {}",
            value
        )))
    }
}

impl InsightCandidate {
    fn check(&self) -> Result<(), String> {
        if (1..=5).contains(&self.confidence) {
            Ok(())
        } else {
            Err(format!(
                "insight confidence must be between 1 and 5, got {}",
                self.confidence
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategorySynthesisResponse {
    /// 2-4 sentence summary of the category
    pub synthesis: String,
    /// Most important takeaways across the category
    #[serde(default)]
    pub top_takeaways: Vec<String>,
    /// Optional non-obvious but evidence-backed insight
    #[serde(default)]
    pub non_obvious_insight: Option<InsightCandidate>,
}

impl StructuredResponse for CategorySynthesisResponse {
    const NAME: &'static str = "category_synthesis";

    fn validate(&self) -> Result<(), String> {
        self.non_obvious_insight
            .as_ref()
            .map_or(Ok(()), InsightCandidate::check)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverallSynthesisResponse {
    /// Major cross-cutting themes
    #[serde(default)]
    pub overall_themes: Vec<String>,
    /// URLs of exceptionally valuable articles
    #[serde(default)]
    pub must_read_overall: Vec<String>,
    /// Optional non-obvious insights that span categories
    #[serde(default)]
    pub cross_category_insights: Vec<InsightCandidate>,
}

impl StructuredResponse for OverallSynthesisResponse {
    const NAME: &'static str = "overall_synthesis";

    fn validate(&self) -> Result<(), String> {
        self.cross_category_insights
            .iter()
            .try_for_each(InsightCandidate::check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{LlmResponse, ResponseSchema, TokenUsage};
    use serde_json::json;

    #[test]
    fn test_category_response_accepts_null_insight() {
        let response = LlmResponse::new(
            json!({"synthesis": "s", "top_takeaways": ["a"], "non_obvious_insight": null}),
            TokenUsage::default(),
        );
        let parsed = response.parse::<CategorySynthesisResponse>().unwrap();
        assert!(parsed.non_obvious_insight.is_none());
    }

    #[test]
    fn test_out_of_range_confidence_fails_whole_response() {
        let response = LlmResponse::new(
            json!({
                "synthesis": "s",
                "non_obvious_insight": {
                    "insight": "i",
                    "why_unintuitive": "w",
                    "confidence": 7,
                    "supporting_urls": []
                }
            }),
            TokenUsage::default(),
        );
        assert!(response.parse::<CategorySynthesisResponse>().is_err());

        let response = LlmResponse::new(
            json!({"cross_category_insights": [{"insight": "i", "why_unintuitive": "w", "confidence": 0}]}),
            TokenUsage::default(),
        );
        assert!(response.parse::<OverallSynthesisResponse>().is_err());
    }

    fn category_with_confidence(confidence: serde_json::Value) -> LlmResponse {
        LlmResponse::new(
            json!({
                "synthesis": "s",
                "top_takeaways": ["a"],
                "non_obvious_insight": {
                    "insight": "i",
                    "why_unintuitive": "w",
                    "confidence": confidence,
                    "supporting_urls": ["https://example.com/a"]
                }
            }),
            TokenUsage::default(),
        )
    }

    #[test]
    fn test_whole_float_confidence_is_accepted() {
        let parsed = category_with_confidence(json!(4.0))
            .parse::<CategorySynthesisResponse>()
            .unwrap();
        assert_eq!(parsed.non_obvious_insight.unwrap().confidence, 4);
        assert_eq!(parsed.top_takeaways, vec!["a"]);

        let parsed = category_with_confidence(json!(5))
            .parse::<CategorySynthesisResponse>()
            .unwrap();
        assert_eq!(parsed.non_obvious_insight.unwrap().confidence, 5);
    }

    #[test]
    fn test_fractional_confidence_is_rejected() {
        for confidence in [json!(4.5), json!(-1), json!(300), json!("4")] {
            assert!(
                category_with_confidence(confidence.clone())
                    .parse::<CategorySynthesisResponse>()
                    .is_err(),
                "confidence {} was accepted",
                confidence
            );
        }
    }

    fn find_property<'a>(schema: &'a serde_json::Value, name: &str) -> Option<&'a serde_json::Value> {
        if let Some(found) = schema.get("properties").and_then(|p| p.get(name)) {
            return Some(found);
        }
        match schema {
            serde_json::Value::Object(map) => map.values().find_map(|v| find_property(v, name)),
            serde_json::Value::Array(items) => items.iter().find_map(|v| find_property(v, name)),
            _ => None,
        }
    }

    #[test]
    fn test_confidence_schema_stays_integer() {
        let schema = ResponseSchema::of::<CategorySynthesisResponse>().unwrap().schema;
        let confidence = find_property(&schema, "confidence").unwrap();
        assert_eq!(confidence["type"], "integer");
        assert_eq!(confidence["minimum"], 1.0);
        assert_eq!(confidence["maximum"], 5.0);
    }

    #[test]
    fn test_overall_response_fields_default_to_empty() {
        let parsed = LlmResponse::new(json!({}), TokenUsage::default())
            .parse::<OverallSynthesisResponse>()
            .unwrap();
        assert!(parsed.overall_themes.is_empty());
        assert!(parsed.must_read_overall.is_empty());
        assert!(parsed.cross_category_insights.is_empty());
    }

    #[test]
    fn test_schema_names_fields() {
        let schema = ResponseSchema::of::<OverallSynthesisResponse>().unwrap();
        assert_eq!(schema.name, "overall_synthesis");
        let text = schema.schema.to_string();
        for field in ["overall_themes", "must_read_overall", "cross_category_insights", "why_unintuitive"] {
            assert!(text.contains(field), "schema is missing {}", field);
        }
    }
}
