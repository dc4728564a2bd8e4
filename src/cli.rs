use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "lipcontour",
    version,
    about = "Lip geometry features from mouth-contour landmarks, with attempt-level dataset splits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize recorded attempts: counts, frame keys and contour names.
    Inspect(InspectArgs),
    /// Extract per-frame lip features into a CSV table.
    Extract(ExtractArgs),
    /// Split a feature table into train/val/test by attempt.
    Split(SplitArgs),
    /// Extract features and split them in one pass.
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to a JSON pipeline configuration.
    #[arg(long, value_name = "PATH", conflicts_with = "config_json")]
    pub config: Option<PathBuf>,
    /// Inline JSON pipeline configuration.
    #[arg(long = "config-json", value_name = "JSON", conflicts_with = "config")]
    pub config_json: Option<String>,
    /// Override the random seed shared by both split steps.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<PipelineConfig> {
        let config =
            PipelineConfig::from_sources(self.config.as_deref(), self.config_json.as_deref())?
                .with_seed(self.seed);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// JSONL files or directories containing them.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// JSONL files or directories containing them.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Destination CSV for the feature table.
    #[arg(long, short, default_value = "features.csv")]
    pub output: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    /// Feature table CSV produced by `extract`.
    #[arg(value_name = "FEATURES")]
    pub features: PathBuf,
    /// Directory receiving the subset tables, matrices and label encoding.
    #[arg(long = "output-dir", short, value_name = "DIR")]
    pub output_dir: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// JSONL files or directories containing them.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory receiving features.csv and the split artifacts.
    #[arg(long = "output-dir", short, value_name = "DIR")]
    pub output_dir: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
}
