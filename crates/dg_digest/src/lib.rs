//! Digest synthesis and insight gating.
//!
//! [`DigestBuilder::build_digest`] partitions summarized articles by
//! category, synthesizes each category, then synthesizes across categories.
//! Every candidate insight passes through [`gate`] before it is kept.

pub mod builder;
pub mod category;
pub mod config;
pub mod gate;
pub mod overall;
pub mod prompts;
pub mod schema;

pub use builder::{partition_by_category, DigestBuilder};
pub use config::{DigestConfig, InsightsMode};
pub use gate::InsightPolicy;

pub mod prelude {
    pub use super::builder::DigestBuilder;
    pub use super::config::{DigestConfig, InsightsMode};
    pub use super::gate::InsightPolicy;
    pub use dg_core::{Article, CategoryDigest, DailyDigest, NonObviousInsight, TokenUsage};
}
