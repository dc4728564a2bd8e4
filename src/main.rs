use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lipcontour::cli::{Cli, Command, ExtractArgs, InspectArgs, RunArgs, SplitArgs};
use lipcontour::config::PipelineConfig;
use lipcontour::features::{FeatureExtractor, UuidIds};
use lipcontour::ingest::{load_attempts, survey_files};
use lipcontour::split::DatasetSplit;
use lipcontour::table::{load_table, save_table};
use lipcontour::types::FeatureTable;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect(args) => handle_inspect(&args),
        Command::Extract(args) => handle_extract(&args),
        Command::Split(args) => handle_split(&args),
        Command::Run(args) => handle_run(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_inspect(args: &InspectArgs) -> Result<()> {
    let config = args.config.load()?;
    let report = load_attempts(&args.inputs, &config.input_extension)
        .context("Failed to load attempts")?;
    let survey =
        survey_files(&args.inputs, &config.input_extension).context("Failed to survey frames")?;

    println!(
        "Loaded {} attempts from {} files ({} malformed lines skipped)",
        report.attempts.len(),
        report.files_read,
        report.skipped_lines
    );
    println!("Frames: {}", survey.frame_count);
    println!("Unique top-level keys in frames: {:?}", survey.frame_keys);
    println!("Contour names: {:?}", survey.contour_names);
    Ok(())
}

fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let config = args.config.load()?;
    let table = extract_features(&args.inputs, &config)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    save_table(&args.output, &table)
        .with_context(|| format!("Failed to write feature table {:?}", args.output))?;
    println!("Wrote {} feature rows to {:?}", table.len(), args.output);
    Ok(())
}

fn handle_split(args: &SplitArgs) -> Result<()> {
    let config = args.config.load()?;
    let table = load_table(&args.features)
        .with_context(|| format!("Failed to load feature table {:?}", args.features))?;
    let split = split_and_write(&table, &config, &args.output_dir)?;
    print_split(&split);
    Ok(())
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let table = extract_features(&args.inputs, &config)?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", args.output_dir))?;
    let features_path = args.output_dir.join("features.csv");
    save_table(&features_path, &table)
        .with_context(|| format!("Failed to write feature table {:?}", features_path))?;
    println!("Wrote {} feature rows to {:?}", table.len(), features_path);

    let split = split_and_write(&table, &config, &args.output_dir)?;
    print_split(&split);
    Ok(())
}

fn extract_features(inputs: &[PathBuf], config: &PipelineConfig) -> Result<FeatureTable> {
    let report =
        load_attempts(inputs, &config.input_extension).context("Failed to load attempts")?;
    let table = FeatureExtractor::new().extract_all(&report.attempts, &mut UuidIds);
    tracing::info!(
        attempts = report.attempts.len(),
        rows = table.len(),
        "feature extraction complete"
    );
    Ok(table)
}

fn split_and_write(
    table: &FeatureTable,
    config: &PipelineConfig,
    output_dir: &Path,
) -> Result<DatasetSplit> {
    let split = config
        .splitter()
        .split(table)
        .context("Failed to split feature table by attempt")?;
    split
        .write_artifacts(output_dir)
        .with_context(|| format!("Failed to write split artifacts to {:?}", output_dir))?;
    Ok(split)
}

fn print_split(split: &DatasetSplit) {
    println!(
        "Classes: {:?} ({} rows dropped during cleaning)",
        split.encoding.classes(),
        split.dropped_rows
    );
    for subset in split.subsets() {
        println!(
            "{:<5} attempts={:<5} rows={:<7} classes={:?}",
            subset.name,
            subset.attempt_count(),
            subset.row_count(),
            subset.class_attempts
        );
    }
}
