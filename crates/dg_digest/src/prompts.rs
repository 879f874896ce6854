use dg_core::{Article, CategoryDigest};

pub const DIGEST_SYNTHESIS_SYSTEM: &str = "\
You are writing a daily newsletter digest for a busy professional. Combine \
several article summaries into one coherent overview that brings the most \
important themes and takeaways to the surface.

Connect related articles, put the most useful takeaways first, point out \
findings that cut against expectations, and favour what the reader can act \
on. Keep it scannable. Use only facts that appear in the provided summaries.

Write like a trusted colleague giving a quick briefing: warm, but brief.";

pub const OVERALL_SYNTHESIS_SYSTEM: &str = "\
You are writing the executive summary of a daily newsletter digest. Find the \
themes that matter most across every category so the reader knows at a \
glance what deserves attention today.

Rank themes and must-read articles by impact, novelty and how actionable \
they are. Use only facts that appear in the provided category summaries.";

fn joined_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// One block per article: title, feed, URL, summary and key points.
pub fn article_summaries(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|article| {
            format!(
                "**{}** ({})\nURL: {}\nSummary: {}\nKey points: {}",
                article.title,
                article.feed_name,
                article.url,
                article
                    .summary
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or("No summary available"),
                joined_or_none(&article.key_takeaways),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn category_prompt(category: &str, articles: &[Article]) -> String {
    format!(
        r#"Here are the summaries of today's {category} articles:

{summaries}

Write a synthesis for this category. Respond with JSON:
{{
    "synthesis": "2-4 sentences covering the key themes and important points across these articles",
    "top_takeaways": ["most important takeaway", "second takeaway", "third takeaway"],
    "non_obvious_insight": {{
        "insight": "one-sentence finding that is not obvious at first glance",
        "why_unintuitive": "one sentence on why this conclusion is unintuitive",
        "confidence": 1-5,
        "supporting_urls": ["url1"]
    }} or null
}}

Only include non_obvious_insight when a genuinely non-obvious conclusion is
supported by the articles. supporting_urls must be taken from the article
URLs above."#,
        category = category,
        summaries = article_summaries(articles),
    )
}

/// One block per category: name, article count, synthesis and takeaways.
pub fn category_summaries(digests: &[CategoryDigest]) -> String {
    digests
        .iter()
        .map(|digest| {
            let urls = digest
                .articles
                .iter()
                .map(|a| a.url.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "**{}** ({} articles)\nSynthesis: {}\nKey takeaways: {}\nURLs: {}",
                digest.name,
                digest.article_count,
                digest.synthesis,
                joined_or_none(&digest.top_takeaways),
                urls,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn overall_prompt(digests: &[CategoryDigest]) -> String {
    format!(
        r#"Here are today's category summaries:

{summaries}

Write an overall synthesis. Respond with JSON:
{{
    "overall_themes": ["theme 1", "theme 2", "theme 3"],
    "must_read_overall": ["url1"],
    "cross_category_insights": [
        {{
            "insight": "one-sentence non-obvious finding that spans categories",
            "why_unintuitive": "one sentence on why this is unintuitive",
            "confidence": 1-5,
            "supporting_urls": ["url1", "url2"]
        }}
    ]
}}

Be highly selective:
- Only 1-3 must_read_overall URLs across everything
- Up to 2 cross_category_insights
- supporting_urls must be taken from the URLs above"#,
        summaries = category_summaries(digests),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dg_core::ArticleStatus;

    fn article(summary: Option<&str>, takeaways: &[&str]) -> Article {
        Article {
            id: "a1".to_string(),
            url: "https://example.com/a1".to_string(),
            title: "Inference Costs Fall".to_string(),
            author: None,
            feed_name: "Infra Weekly".to_string(),
            feed_url: "https://example.com/feed".to_string(),
            published: Utc::now(),
            content: String::new(),
            word_count: 0,
            category: "Technology".to_string(),
            summary: summary.map(str::to_string),
            key_takeaways: takeaways.iter().map(|t| t.to_string()).collect(),
            action_items: vec![],
            status: ArticleStatus::Summarized,
        }
    }

    #[test]
    fn test_article_block_contents() {
        let text = article_summaries(&[article(Some("Costs keep falling."), &["Cheaper", "Faster"])]);
        assert!(text.contains("**Inference Costs Fall** (Infra Weekly)"));
        assert!(text.contains("URL: https://example.com/a1"));
        assert!(text.contains("Summary: Costs keep falling."));
        assert!(text.contains("Key points: Cheaper, Faster"));
    }

    #[test]
    fn test_article_block_placeholders() {
        let text = article_summaries(&[article(None, &[])]);
        assert!(text.contains("Summary: No summary available"));
        assert!(text.contains("Key points: None"));
    }

    #[test]
    fn test_category_prompt_names_category() {
        let prompt = category_prompt("Technology", &[article(None, &[])]);
        assert!(prompt.starts_with("Here are the summaries of today's Technology articles:"));
        assert!(prompt.contains("\"non_obvious_insight\""));
    }
}
