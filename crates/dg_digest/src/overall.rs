use dg_core::{generate_structured, CategoryDigest, LlmClient, NonObviousInsight, TokenUsage};
use tracing::warn;

use crate::gate::{self, InsightPolicy};
use crate::prompts;
use crate::schema::OverallSynthesisResponse;

pub const MAX_MUST_READ: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallSynthesis {
    pub overall_themes: Vec<String>,
    pub must_read: Vec<String>,
    pub non_obvious_insights: Vec<NonObviousInsight>,
}

/// Cross-category themes, must-reads and insights.
pub struct OverallSynthesizer<'a> {
    client: &'a dyn LlmClient,
    policy: InsightPolicy,
    max_insights: usize,
}

impl<'a> OverallSynthesizer<'a> {
    pub fn new(client: &'a dyn LlmClient, policy: InsightPolicy, max_insights: usize) -> Self {
        Self {
            client,
            policy,
            max_insights,
        }
    }

    pub async fn synthesize(&self, digests: &[CategoryDigest]) -> (OverallSynthesis, TokenUsage) {
        if digests.is_empty() {
            return (OverallSynthesis::default(), TokenUsage::default());
        }

        let (result, usage) = generate_structured::<OverallSynthesisResponse>(
            self.client,
            prompts::overall_prompt(digests),
            prompts::OVERALL_SYNTHESIS_SYSTEM,
        )
        .await;

        match result {
            Ok(parsed) => (self.from_response(digests, parsed), usage),
            Err(e) => {
                warn!("Overall synthesis failed: {}", e);
                (OverallSynthesis::default(), usage)
            }
        }
    }

    fn from_response(&self, digests: &[CategoryDigest], parsed: OverallSynthesisResponse) -> OverallSynthesis {
        let allowed_urls = gate::allowed_url_set(
            digests
                .iter()
                .flat_map(|d| d.articles.iter())
                .map(|a| a.url.as_str()),
        );

        let mut must_read = gate::filter_urls(&parsed.must_read_overall, &allowed_urls);
        must_read.truncate(MAX_MUST_READ);

        let non_obvious_insights = gate::approve_insights(
            self.policy,
            &parsed.cross_category_insights,
            &allowed_urls,
            &parsed.overall_themes,
            self.max_insights,
        );

        OverallSynthesis {
            overall_themes: parsed.overall_themes,
            must_read,
            non_obvious_insights,
        }
    }
}
