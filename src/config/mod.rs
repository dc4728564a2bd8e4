use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;

use crate::split::{AttemptSplitter, DEFAULT_SEED, DEFAULT_TEST_FRACTION, DEFAULT_VAL_FRACTION};

/// Runtime settings for extraction and splitting, parsed from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Fraction of all attempts held out for testing.
    #[serde(alias = "testFraction")]
    pub test_fraction: f64,
    /// Fraction of trainval attempts held out for validation.
    #[serde(alias = "valFraction")]
    pub val_fraction: f64,
    pub seed: u64,
    /// File extension picked up when an input is a directory.
    #[serde(alias = "inputExtension")]
    pub input_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            val_fraction: DEFAULT_VAL_FRACTION,
            seed: DEFAULT_SEED,
            input_extension: "jsonl".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads from a file or inline JSON, falling back to defaults when neither is given.
    pub fn from_sources(path: Option<&Path>, json: Option<&str>) -> Result<Self> {
        match (path, json) {
            (Some(_), Some(_)) => bail!("provide a config file or inline config JSON, not both"),
            (Some(p), None) => {
                let data = fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {:?}", p))?;
                Self::parse(&data)
            }
            (None, Some(raw)) => Self::parse(raw),
            (None, None) => Ok(Self::default()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("failed to parse config JSON")?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("test_fraction", self.test_fraction),
            ("val_fraction", self.val_fraction),
        ] {
            ensure!(
                value > 0.0 && value < 1.0,
                "{} must lie strictly between 0 and 1, got {}",
                name,
                value
            );
        }
        ensure!(
            !self.input_extension.trim().is_empty(),
            "input_extension must not be empty"
        );
        Ok(())
    }

    pub fn splitter(&self) -> AttemptSplitter {
        AttemptSplitter::new(self.test_fraction, self.val_fraction, self.seed)
    }
}
