use std::collections::HashMap;
use std::fs;
use std::path::Path;

use dg_core::{Result, TokenUsage};
use serde::Deserialize;
use tracing::{debug, warn};

const BUNDLED_PRICING: &str = include_str!("../data/pricing.json");

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_cost_per_mtok: f64,
    pub output_cost_per_mtok: f64,
}

#[derive(Deserialize)]
struct PricingFile {
    #[serde(default)]
    models: HashMap<String, PricingEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingEntry {
    input_cost_per_m_tok: f64,
    output_cost_per_m_tok: f64,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Model name and alias lookup, built once at startup and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_PRICING)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut table = Self::new();
        table.merge_json_str(json)?;
        Ok(table)
    }

    /// Load every `*.json` file in `dir`, later files overriding earlier ones.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut paths: Vec<_> = fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();

        let mut table = Self::new();
        for path in paths {
            debug!("Loading pricing data from {}", path.display());
            table.merge_json_str(&fs::read_to_string(&path)?)?;
        }
        Ok(table)
    }

    pub fn merge_json_str(&mut self, json: &str) -> Result<()> {
        let file: PricingFile = serde_json::from_str(json)?;
        for (name, entry) in file.models {
            let pricing = ModelPricing {
                input_cost_per_mtok: entry.input_cost_per_m_tok,
                output_cost_per_mtok: entry.output_cost_per_m_tok,
            };
            for alias in entry.aliases {
                self.models.insert(alias, pricing);
            }
            self.models.insert(name, pricing);
        }
        Ok(())
    }

    pub fn lookup(&self, model: &str) -> Option<ModelPricing> {
        self.models.get(model).copied()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// USD cost of a run, or `None` when the model is unknown.
    pub fn estimate_cost(&self, model: &str, usage: TokenUsage) -> Option<f64> {
        let Some(pricing) = self.lookup(model) else {
            warn!("No pricing data for model '{}'", model);
            return None;
        };
        Some(
            (usage.input_tokens as f64 / 1_000_000.0) * pricing.input_cost_per_mtok
                + (usage.output_tokens as f64 / 1_000_000.0) * pricing.output_cost_per_mtok,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "models": {
            "test-model": {
                "inputCostPerMTok": 2.0,
                "outputCostPerMTok": 10.0,
                "aliases": ["test-model-latest"]
            }
        }
    }"#;

    #[test]
    fn test_lookup_by_name_and_alias() {
        let table = PricingTable::from_json_str(SAMPLE).unwrap();
        let by_name = table.lookup("test-model").unwrap();
        assert_eq!(by_name.input_cost_per_mtok, 2.0);
        assert_eq!(table.lookup("test-model-latest"), Some(by_name));
        assert!(table.lookup("other").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_estimate_cost() {
        let table = PricingTable::from_json_str(SAMPLE).unwrap();
        let cost = table
            .estimate_cost("test-model", TokenUsage::new(1_000_000, 500_000))
            .unwrap();
        assert!((cost - 7.0).abs() < 1e-9);
        assert!(table.estimate_cost("unknown", TokenUsage::new(10, 10)).is_none());
    }

    #[test]
    fn test_bundled_table_covers_provider_defaults() {
        let table = PricingTable::bundled().unwrap();
        for provider in [crate::Provider::Gemini, crate::Provider::OpenAi] {
            assert!(table.lookup(provider.default_model()).is_some());
        }
    }

    #[test]
    fn test_load_dir_reads_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not json").unwrap();
        let table = PricingTable::load_dir(dir.path()).unwrap();
        assert!(table.lookup("test-model").is_some());
    }
}
