//! Confidence, provenance and duplicate gating for candidate insights.
//!
//! Everything here is a pure function of its arguments: the same candidate
//! checked against the same allowed URLs and context always gets the same
//! verdict.

use std::collections::HashSet;
use std::fmt;

use dg_core::NonObviousInsight;
use tracing::debug;

use crate::schema::InsightCandidate;

/// Token-overlap ratio at or above which two texts count as the same claim.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightPolicy {
    /// Never surface insights.
    Off,
    /// Surface insights at or above `min_confidence`.
    Auto { min_confidence: u8 },
    /// Surface any insight that passes the content checks.
    Always,
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Disabled,
    LowConfidence { confidence: u8, min_confidence: u8 },
    EmptyText,
    NoVerifiedSources,
    NearDuplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Disabled => f.write_str("insights are disabled"),
            Rejection::LowConfidence {
                confidence,
                min_confidence,
            } => write!(f, "confidence {} is below {}", confidence, min_confidence),
            Rejection::EmptyText => f.write_str("insight or justification is empty"),
            Rejection::NoVerifiedSources => f.write_str("no supporting URL is among the source articles"),
            Rejection::NearDuplicate => f.write_str("repeats an existing statement"),
        }
    }
}

/// Run every gate rule in order and report the first failure.
pub fn evaluate(
    policy: InsightPolicy,
    candidate: &InsightCandidate,
    allowed_urls: &HashSet<String>,
    existing_texts: &[String],
) -> Result<NonObviousInsight, Rejection> {
    match policy {
        InsightPolicy::Off => return Err(Rejection::Disabled),
        InsightPolicy::Auto { min_confidence } if candidate.confidence < min_confidence => {
            return Err(Rejection::LowConfidence {
                confidence: candidate.confidence,
                min_confidence,
            });
        }
        InsightPolicy::Auto { .. } | InsightPolicy::Always => {}
    }

    let insight = candidate.insight.trim();
    let why_unintuitive = candidate.why_unintuitive.trim();
    if insight.is_empty() || why_unintuitive.is_empty() {
        return Err(Rejection::EmptyText);
    }

    let supporting_urls = filter_urls(&candidate.supporting_urls, allowed_urls);
    if supporting_urls.is_empty() {
        return Err(Rejection::NoVerifiedSources);
    }

    if is_near_duplicate(insight, existing_texts) {
        return Err(Rejection::NearDuplicate);
    }

    Ok(NonObviousInsight {
        insight: insight.to_string(),
        why_unintuitive: why_unintuitive.to_string(),
        confidence: candidate.confidence,
        supporting_urls,
    })
}

/// Gate a single candidate. Rejections are logged, never raised.
pub fn approve_insight(
    policy: InsightPolicy,
    candidate: Option<&InsightCandidate>,
    allowed_urls: &HashSet<String>,
    existing_texts: &[String],
) -> Option<NonObviousInsight> {
    let candidate = candidate?;
    match evaluate(policy, candidate, allowed_urls, existing_texts) {
        Ok(insight) => Some(insight),
        Err(reason) => {
            debug!("Dropping insight {:?}: {}", candidate.insight, reason);
            None
        }
    }
}

/// Gate candidates in order, checking each against the context plus every
/// insight approved before it, and stop once `max_count` are approved.
pub fn approve_insights(
    policy: InsightPolicy,
    candidates: &[InsightCandidate],
    allowed_urls: &HashSet<String>,
    existing_texts: &[String],
    max_count: usize,
) -> Vec<NonObviousInsight> {
    let mut approved: Vec<NonObviousInsight> = Vec::new();
    if max_count == 0 {
        return approved;
    }

    let mut context = existing_texts.to_vec();
    for candidate in candidates {
        let Some(insight) = approve_insight(policy, Some(candidate), allowed_urls, &context) else {
            continue;
        };
        context.push(insight.insight.clone());
        approved.push(insight);
        if approved.len() >= max_count {
            break;
        }
    }
    approved
}

/// Trim whitespace and trailing slashes so equivalent URLs compare equal.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

pub fn allowed_url_set<'a>(urls: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    urls.into_iter().map(normalize_url).collect()
}

/// Normalized URLs that appear in `allowed_urls`, first occurrence kept.
pub fn filter_urls(urls: &[String], allowed_urls: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|url| normalize_url(url))
        .filter(|url| allowed_urls.contains(url) && seen.insert(url.clone()))
        .collect()
}

/// Lowercase and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(normalized: &str) -> HashSet<&str> {
    normalized
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

/// A candidate with no usable words counts as a duplicate.
pub fn is_near_duplicate(candidate: &str, existing_texts: &[String]) -> bool {
    let normalized = normalize_text(candidate);
    let candidate_tokens = tokens(&normalized);
    if candidate_tokens.is_empty() {
        return true;
    }

    existing_texts.iter().any(|text| {
        let existing = normalize_text(text);
        if existing.is_empty() {
            return false;
        }
        if existing == normalized {
            return true;
        }
        let existing_tokens = tokens(&existing);
        if existing_tokens.is_empty() {
            return false;
        }
        let shared = candidate_tokens.intersection(&existing_tokens).count();
        let smaller = candidate_tokens.len().min(existing_tokens.len());
        shared as f64 / smaller as f64 >= NEAR_DUPLICATE_THRESHOLD
    })
}
