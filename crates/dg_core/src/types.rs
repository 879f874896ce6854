use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Summarized,
    Digested,
    Failed,
}

impl Default for ArticleStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Summarized => "summarized",
            ArticleStatus::Digested => "digested",
            ArticleStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl FromStr for ArticleStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "summarized" => Ok(Self::Summarized),
            "digested" => Ok(Self::Digested),
            "failed" => Ok(Self::Failed),
            other => Err(Error::Config(format!("Unknown article status: {}", other))),
        }
    }
}

/// A feed article after summarization. Read-only to the digest engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub feed_name: String,
    pub feed_url: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: usize,
    pub category: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub status: ArticleStatus,
}

/// A finding that survived the confidence, provenance and duplicate checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonObviousInsight {
    pub insight: String,
    pub why_unintuitive: String,
    pub confidence: u8,
    pub supporting_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDigest {
    pub name: String,
    pub article_count: usize,
    pub articles: Vec<Article>,
    pub synthesis: String,
    pub top_takeaways: Vec<String>,
    pub non_obvious_insight: Option<NonObviousInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDigest {
    pub id: String,
    pub date: DateTime<Utc>,
    pub categories: Vec<CategoryDigest>,
    pub total_articles: usize,
    pub total_feeds: usize,
    pub overall_themes: Vec<String>,
    pub must_read: Vec<String>,
    pub non_obvious_insights: Vec<NonObviousInsight>,
    pub processing_time_seconds: f64,
}

impl DailyDigest {
    /// Every article covered by the digest, in category order.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.categories.iter().flat_map(|c| c.articles.iter())
    }
}

/// Token counts reported by the provider, summed across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self { input_tokens, output_tokens }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage::new(self.input_tokens + rhs.input_tokens, self.output_tokens + rhs.output_tokens)
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), |acc, u| acc + u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ArticleStatus::Pending,
            ArticleStatus::Summarized,
            ArticleStatus::Digested,
            ArticleStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<ArticleStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn test_article_defaults_optional_fields() {
        let json = r#"{
            "id": "a1",
            "url": "https://example.com/a",
            "title": "A",
            "feed_name": "Feed",
            "feed_url": "https://example.com/feed",
            "published": "2024-05-01T08:00:00Z",
            "category": "Technology"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.status, ArticleStatus::Pending);
        assert!(article.summary.is_none());
        assert!(article.key_takeaways.is_empty());
    }

    #[test]
    fn test_token_usage_sums() {
        let total: TokenUsage = vec![TokenUsage::new(50, 25), TokenUsage::new(40, 20)]
            .into_iter()
            .sum();
        assert_eq!(total, TokenUsage::new(90, 45));
        assert_eq!(total.total(), 135);
    }
}
