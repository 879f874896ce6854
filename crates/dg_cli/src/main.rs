use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dg_core::{ArticleStatus, ArticleStorage, TokenUsage};
use dg_digest::{DigestBuilder, DigestConfig, InsightsMode};
use dg_inference::pricing::PricingTable;
use dg_inference::{Config, Provider};
use dg_storage::{create_storage, StorageBackend};
use tracing::{info, warn};

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a daily digest from summarized articles", long_about = None)]
pub struct Cli {
    /// Article store backend: memory or json
    #[arg(long, global = true, default_value = "json")]
    storage: String,
    /// Path of the json article store
    #[arg(long, global = true, default_value = "articles.json")]
    store_path: String,
    /// LLM provider: gemini, openai or dummy
    #[arg(long, global = true, env = "LLM_PROVIDER", default_value = "gemini")]
    provider: String,
    #[arg(long, global = true, env = "LLM_MODEL")]
    model: Option<String>,
    #[arg(long, global = true, env = "LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Insight gating: off, auto or always
    #[arg(long, global = true, env = "INSIGHTS_MODE", default_value = "auto")]
    insights_mode: String,
    #[arg(long, global = true, env = "INSIGHT_MIN_CONFIDENCE", default_value_t = 4)]
    insight_min_confidence: u8,
    #[arg(long = "max-insights", global = true, env = "MAX_INSIGHTS_PER_DIGEST", default_value_t = 2)]
    max_insights_per_digest: usize,
    /// Category syntheses in flight at once
    #[arg(long, global = true, default_value_t = 1)]
    concurrency: usize,
    #[arg(long, global = true, default_value_t = 2)]
    max_retries: u32,
    /// Directory of pricing JSON files; the bundled table is used otherwise
    #[arg(long, global = true)]
    pricing: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Build a digest from every summarized article in the store
    Build {
        /// Write the digest JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Move the included articles to the digested status
        #[arg(long)]
        mark_digested: bool,
    },
    /// List providers and their default models
    Models,
}

impl Cli {
    fn inference_config(&self) -> anyhow::Result<Config> {
        Ok(Config {
            provider: self.provider.parse::<Provider>()?,
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            ..Config::default()
        })
    }

    fn digest_config(&self) -> anyhow::Result<DigestConfig> {
        let config = DigestConfig {
            insights_mode: self.insights_mode.parse::<InsightsMode>()?,
            insight_min_confidence: self.insight_min_confidence,
            max_insights_per_digest: self.max_insights_per_digest,
            max_concurrent_categories: self.concurrency,
        };
        config.validate()?;
        Ok(config)
    }

    fn pricing_table(&self) -> anyhow::Result<PricingTable> {
        let table = match &self.pricing {
            Some(dir) => PricingTable::load_dir(dir)
                .with_context(|| format!("Failed to load pricing from {}", dir.display()))?,
            None => PricingTable::bundled()?,
        };
        Ok(table)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match &cli.command {
        Commands::Models => {
            for provider in Provider::ALL {
                println!("{:<8} {}", provider, provider.default_model());
            }
            Ok(())
        }
        Commands::Build {
            output,
            mark_digested,
        } => build(&cli, output.as_ref(), *mark_digested).await,
    }
}

async fn build(cli: &Cli, output: Option<&PathBuf>, mark_digested: bool) -> anyhow::Result<()> {
    let digest_config = cli.digest_config()?;
    let inference_config = cli.inference_config()?;

    let storage = create_storage(&cli.storage, Some(&cli.store_path)).await?;
    info!("💾 Storage initialized successfully (using {})", storage.kind());

    let articles = storage.get_by_status(ArticleStatus::Summarized).await?;
    if articles.is_empty() {
        info!("📭 No summarized articles to digest");
        return Ok(());
    }

    let model_name = inference_config.resolved_model();
    let client = dg_inference::models::create_model(inference_config)?;
    info!("🧠 Inference model initialized successfully (using {} / {})", client.name(), client.model());

    let builder = DigestBuilder::new(client, digest_config)?;
    info!("📰 Building digest from {} articles", articles.len());
    let (digest, usage) = builder.build_digest(&articles).await;

    let json = serde_json::to_string_pretty(&digest)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write digest to {}", path.display()))?;
            info!("✨ Digest {} written to {}", digest.id, path.display());
        }
        None => println!("{}", json),
    }

    report_usage(cli, &model_name, usage);

    if mark_digested {
        mark_articles(storage.as_ref(), digest.articles().map(|a| a.id.as_str())).await?;
    }
    Ok(())
}

fn report_usage(cli: &Cli, model_name: &str, usage: TokenUsage) {
    info!(
        "🔢 Tokens used: {} input, {} output",
        usage.input_tokens, usage.output_tokens
    );
    match cli.pricing_table() {
        Ok(table) => {
            if let Some(cost) = table.estimate_cost(model_name, usage) {
                info!("💰 Estimated cost: ${:.4}", cost);
            }
        }
        Err(e) => warn!("⚠️ Pricing unavailable: {}", e),
    }
}

async fn mark_articles<'a>(
    storage: &dyn StorageBackend,
    ids: impl Iterator<Item = &'a str>,
) -> anyhow::Result<()> {
    let mut marked = 0usize;
    for id in ids {
        storage.update_status(id, ArticleStatus::Digested).await?;
        marked += 1;
    }
    info!("✅ Marked {} articles as digested", marked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};
    use std::time::Duration;

    /// Parse with every `env` fallback removed, so the ambient environment
    /// cannot change the outcome.
    fn parse(args: &[&str]) -> Cli {
        let command = Cli::command().mut_args(|arg| arg.env(None::<&str>));
        let matches = command.try_get_matches_from(args).unwrap();
        Cli::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_build_args() {
        let cli = parse(&[
            "digest",
            "--provider",
            "dummy",
            "--insights-mode",
            "always",
            "--max-insights",
            "3",
            "build",
            "--mark-digested",
        ]);
        assert!(matches!(cli.command, Commands::Build { mark_digested: true, .. }));

        let config = cli.digest_config().unwrap();
        assert_eq!(config.insights_mode, InsightsMode::Always);
        assert_eq!(config.max_insights_per_digest, 3);
        assert_eq!(cli.inference_config().unwrap().provider, Provider::Dummy);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["digest", "models"]);
        assert_eq!(cli.digest_config().unwrap(), DigestConfig::default());
        let config = cli.inference_config().unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_rejects_bad_confidence() {
        let cli = parse(&["digest", "--insight-min-confidence", "7", "models"]);
        assert!(cli.digest_config().is_err());
    }

    #[test]
    fn test_env_fallback() {
        std::env::set_var("MAX_INSIGHTS_PER_DIGEST", "5");
        let from_env = Cli::try_parse_from(["digest", "models"]).unwrap();
        let from_flag = Cli::try_parse_from(["digest", "--max-insights", "1", "models"]).unwrap();
        let ignoring_env = parse(&["digest", "models"]);
        std::env::remove_var("MAX_INSIGHTS_PER_DIGEST");

        assert_eq!(from_env.max_insights_per_digest, 5);
        assert_eq!(from_flag.max_insights_per_digest, 1);
        assert_eq!(ignoring_env.max_insights_per_digest, 2);
    }
}
