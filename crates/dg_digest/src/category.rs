use std::collections::HashSet;

use dg_core::{generate_structured, Article, CategoryDigest, LlmClient, TokenUsage};
use tracing::{info, warn};

use crate::gate::{self, InsightPolicy};
use crate::prompts;
use crate::schema::CategorySynthesisResponse;

/// Produces one `CategoryDigest` per category.
pub struct CategorySynthesizer<'a> {
    client: &'a dyn LlmClient,
    policy: InsightPolicy,
}

impl<'a> CategorySynthesizer<'a> {
    pub fn new(client: &'a dyn LlmClient, policy: InsightPolicy) -> Self {
        Self { client, policy }
    }

    /// `articles` must be non-empty. A single article never reaches the LLM.
    pub async fn synthesize(&self, name: String, articles: Vec<Article>) -> (CategoryDigest, TokenUsage) {
        info!("Processing category: {} ({} articles)", name, articles.len());

        if articles.len() == 1 {
            return (single_article_digest(name, articles), TokenUsage::default());
        }

        let allowed_urls = gate::allowed_url_set(articles.iter().map(|a| a.url.as_str()));
        let (result, usage) = generate_structured::<CategorySynthesisResponse>(
            self.client,
            prompts::category_prompt(&name, &articles),
            prompts::DIGEST_SYNTHESIS_SYSTEM,
        )
        .await;

        let digest = match result {
            Ok(parsed) => self.from_response(name, articles, parsed, &allowed_urls),
            Err(e) => {
                warn!("Category synthesis failed for {}: {}", name, e);
                fallback_digest(name, articles)
            }
        };
        (digest, usage)
    }

    fn from_response(
        &self,
        name: String,
        articles: Vec<Article>,
        parsed: CategorySynthesisResponse,
        allowed_urls: &HashSet<String>,
    ) -> CategoryDigest {
        let top_takeaways = clean_takeaways(parsed.top_takeaways);
        // Only the takeaways serve as duplicate context for the single category candidate.
        let non_obvious_insight = gate::approve_insight(
            self.policy,
            parsed.non_obvious_insight.as_ref(),
            allowed_urls,
            &top_takeaways,
        );
        CategoryDigest {
            name,
            article_count: articles.len(),
            articles,
            synthesis: parsed.synthesis.trim().to_string(),
            top_takeaways,
            non_obvious_insight,
        }
    }
}

fn single_article_digest(name: String, articles: Vec<Article>) -> CategoryDigest {
    let article = &articles[0];
    let synthesis = article
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("One article from {}.", article.feed_name));
    let top_takeaways = article.key_takeaways.iter().take(3).cloned().collect();
    CategoryDigest {
        name,
        article_count: 1,
        articles,
        synthesis,
        top_takeaways,
        non_obvious_insight: None,
    }
}

/// Deterministic synthesis used when the LLM call or its response fails.
pub fn fallback_digest(name: String, articles: Vec<Article>) -> CategoryDigest {
    let synthesis = format!(
        "Today's {} coverage includes {} articles.",
        name,
        articles.len()
    );
    let top_takeaways = articles
        .iter()
        .take(3)
        .filter_map(|a| a.key_takeaways.first().cloned())
        .collect();
    CategoryDigest {
        name,
        article_count: articles.len(),
        articles,
        synthesis,
        top_takeaways,
        non_obvious_insight: None,
    }
}

/// Trim, drop blanks, drop exact repeats.
fn clean_takeaways(takeaways: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    takeaways
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
