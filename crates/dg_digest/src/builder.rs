use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dg_core::{Article, DailyDigest, LlmClient, Result, TokenUsage};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::info;
use uuid::Uuid;

use crate::category::CategorySynthesizer;
use crate::config::DigestConfig;
use crate::overall::OverallSynthesizer;

/// Group articles by category. Keys iterate in lexicographic order and every
/// article lands in exactly one group, keeping its input order.
pub fn partition_by_category(articles: &[Article]) -> BTreeMap<String, Vec<Article>> {
    let mut by_category: BTreeMap<String, Vec<Article>> = BTreeMap::new();
    for article in articles {
        by_category
            .entry(article.category.clone())
            .or_default()
            .push(article.clone());
    }
    by_category
}

pub struct DigestBuilder {
    client: Arc<dyn LlmClient>,
    config: DigestConfig,
}

impl fmt::Debug for DigestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestBuilder")
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}

impl DigestBuilder {
    pub fn new(client: Arc<dyn LlmClient>, config: DigestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Build the daily digest. Never fails: synthesis problems degrade to
    /// deterministic fallbacks. Returns the provider token usage of the run.
    pub async fn build_digest(&self, articles: &[Article]) -> (DailyDigest, TokenUsage) {
        let started = Instant::now();
        info!("Building digest from {} articles", articles.len());

        let policy = self.config.insight_policy();
        let categories = CategorySynthesizer::new(self.client.as_ref(), policy);
        let permits = Semaphore::new(self.config.max_concurrent_categories.max(1));

        let results = join_all(partition_by_category(articles).into_iter().map(
            |(name, group)| {
                let categories = &categories;
                let permits = &permits;
                async move {
                    let _permit = permits.acquire().await.ok();
                    categories.synthesize(name, group).await
                }
            },
        ))
        .await;

        let mut usage = TokenUsage::default();
        let mut category_digests = Vec::with_capacity(results.len());
        for (digest, category_usage) in results {
            usage += category_usage;
            category_digests.push(digest);
        }

        let overall = OverallSynthesizer::new(
            self.client.as_ref(),
            policy,
            self.config.max_insights_per_digest,
        );
        let (synthesis, overall_usage) = overall.synthesize(&category_digests).await;
        usage += overall_usage;

        let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let total_feeds = articles
            .iter()
            .map(|a| a.feed_url.as_str())
            .collect::<HashSet<_>>()
            .len();

        let digest = DailyDigest {
            id,
            date: Utc::now(),
            categories: category_digests,
            total_articles: articles.len(),
            total_feeds,
            overall_themes: synthesis.overall_themes,
            must_read: synthesis.must_read,
            non_obvious_insights: synthesis.non_obvious_insights,
            processing_time_seconds: started.elapsed().as_secs_f64(),
        };

        info!(
            "Digest built: {} articles, {} categories, {} input / {} output tokens",
            digest.total_articles,
            digest.categories.len(),
            usage.input_tokens,
            usage.output_tokens
        );
        (digest, usage)
    }
}
