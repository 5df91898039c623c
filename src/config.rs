//! JSON configuration surface consumed by the correction core.
//!
//! Every field has a default, so a partial document (or no document at all)
//! still yields a working configuration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::GenerationParams;
use crate::rules::PipelineConfig;
use crate::scoring::ScoreVariant;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub system: SystemSettings,
    pub correction: CorrectionSettings,
    pub llm: LlmSettings,
    pub cost: CostSettings,
    pub custom_patterns: CustomPatterns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub enable_llm: bool,
    pub aws_region: String,
    pub model_id: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            enable_llm: true,
            aws_region: "us-east-1".to_string(),
            model_id: "amazon.nova-micro-v1:0".to_string(),
        }
    }
}

/// Per-stage toggles plus the live scoring variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSettings {
    pub enable_tech_terms: bool,
    pub enable_ending_fixes: bool,
    pub enable_repetition_removal: bool,
    pub enable_filler_removal: bool,
    pub enable_naturalization: bool,
    pub enable_punctuation: bool,
    pub enable_normalization: bool,
    pub scoring: ScoreVariant,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            enable_tech_terms: true,
            enable_ending_fixes: true,
            enable_repetition_removal: true,
            enable_filler_removal: true,
            enable_naturalization: true,
            enable_punctuation: true,
            enable_normalization: true,
            scoring: ScoreVariant::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    /// Segments whose rule-pass score falls below this are escalated even
    /// when no residual-defect detector fires; 0.0 disables the widening
    pub use_threshold: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 1000,
            use_threshold: 0.0,
        }
    }
}

/// Session cost ceiling and alert, in the display currency (JPY)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSettings {
    pub max_cost_per_session: f64,
    pub alert_threshold: f64,
    pub cost_tracking: bool,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            max_cost_per_session: 100.0,
            alert_threshold: 50.0,
            cost_tracking: true,
        }
    }
}

/// Custom term dictionaries merged into the technical-term stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomPatterns {
    pub tech_terms: BTreeMap<String, String>,
    pub organization_names: BTreeMap<String, String>,
    pub product_names: BTreeMap<String, String>,
}

impl CustomPatterns {
    /// All custom entries, in dictionary order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tech_terms
            .iter()
            .chain(self.organization_names.iter())
            .chain(self.product_names.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                info!("Loaded configuration from {:?}", path);
                Ok(config)
            }
            Some(path) => {
                info!("Config file {:?} not found, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write config JSON")?;
        Ok(())
    }

    /// Stage toggles for the rule pipeline
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            tech_terms: self.correction.enable_tech_terms,
            ending_fixes: self.correction.enable_ending_fixes,
            repetition_removal: self.correction.enable_repetition_removal,
            filler_removal: self.correction.enable_filler_removal,
            naturalization: self.correction.enable_naturalization,
            punctuation: self.correction.enable_punctuation,
            normalization: self.correction.enable_normalization,
        }
    }

    /// Generation parameters for the escalation adapter
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.llm.temperature,
            top_p: self.llm.top_p,
            max_tokens: self.llm.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.system.enable_llm);
        assert!(config.correction.enable_tech_terms);
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.use_threshold, 0.0);
        assert_eq!(config.correction.scoring, ScoreVariant::Simple);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"llm": {"temperature": 0.5}}"#).unwrap();
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.llm.top_p, 0.9);
        assert!(config.correction.enable_punctuation);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("correction_config.json");

        let mut config = AppConfig::default();
        config.system.enable_llm = false;
        config
            .custom_patterns
            .product_names
            .insert("Googleコラボ".to_string(), "Google Colab".to_string());
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert!(!loaded.system.enable_llm);
        assert_eq!(
            loaded.custom_patterns.product_names["Googleコラボ"],
            "Google Colab"
        );
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let config = AppConfig::load_or_default(Some(&missing)).unwrap();
        assert!(config.system.enable_llm);
    }

    #[test]
    fn test_custom_entries_order() {
        let mut config = AppConfig::default();
        config
            .custom_patterns
            .tech_terms
            .insert("岩澤研".to_string(), "岩澤研究室".to_string());
        config
            .custom_patterns
            .organization_names
            .insert("松尾岩澤研".to_string(), "松尾・岩澤研".to_string());

        let entries: Vec<(&str, &str)> = config.custom_patterns.entries().collect();
        assert_eq!(entries[0], ("岩澤研", "岩澤研究室"));
        assert_eq!(entries[1], ("松尾岩澤研", "松尾・岩澤研"));
    }
}
