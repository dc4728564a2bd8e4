use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::Attempt;
use crate::{PipelineError, Result};

/// Attempts loaded from one or more JSONL sources.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub attempts: Vec<Attempt>,
    pub files_read: usize,
    pub skipped_lines: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: IngestReport) {
        self.attempts.extend(other.attempts);
        self.files_read += other.files_read;
        self.skipped_lines += other.skipped_lines;
    }
}

/// Expands inputs into JSONL files. Directories contribute every file with
/// the given extension, sorted by path.
pub fn resolve_inputs(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input).map_err(|err| {
                PipelineError::new(format!("failed to read directory {:?}: {err}", input))
            })?;
            let mut found = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|err| {
                        PipelineError::new(format!("failed to read entry in {:?}: {err}", input))
                    })?
                    .path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(PipelineError::new(format!(
                "input path does not exist: {:?}",
                input
            )));
        }
    }
    Ok(files)
}

/// Parses attempts from JSONL text. Blank lines are ignored; lines that fail
/// to parse are logged and counted as skipped.
pub fn parse_attempts(reader: impl BufRead, source: &str) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|err| PipelineError::new(format!("failed to read {source}: {err}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Attempt>(trimmed) {
            Ok(attempt) => report.attempts.push(attempt),
            Err(err) => {
                warn!(source, line = idx + 1, error = %err, "skipping malformed attempt record");
                report.skipped_lines += 1;
            }
        }
    }
    Ok(report)
}

pub fn load_file(path: &Path) -> Result<IngestReport> {
    let file = File::open(path)
        .map_err(|err| PipelineError::new(format!("failed to open {:?}: {err}", path)))?;
    let mut report = parse_attempts(BufReader::new(file), &path.display().to_string())?;
    report.files_read = 1;
    debug!(
        path = %path.display(),
        attempts = report.attempts.len(),
        skipped = report.skipped_lines,
        "loaded attempt file"
    );
    Ok(report)
}

/// Loads every attempt reachable from `inputs`.
pub fn load_attempts(inputs: &[PathBuf], extension: &str) -> Result<IngestReport> {
    let files = resolve_inputs(inputs, extension)?;
    let mut report = IngestReport::default();
    for path in &files {
        report.absorb(load_file(path)?);
    }
    info!(
        attempts = report.attempts.len(),
        files = report.files_read,
        skipped = report.skipped_lines,
        "loaded attempts"
    );
    Ok(report)
}

/// Keys observed across the frames of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSurvey {
    pub frame_keys: BTreeSet<String>,
    pub contour_names: BTreeSet<String>,
    pub frame_count: usize,
}

/// Collects the top-level frame keys and contour names present in raw JSONL
/// records. Works on untyped values so unexpected keys are still reported.
pub fn survey_frames(reader: impl BufRead) -> FrameSurvey {
    let mut survey = FrameSurvey::default();
    for line in reader.lines().map_while(|line| line.ok()) {
        let Ok(value) = serde_json::from_str::<Value>(line.trim()) else {
            continue;
        };
        let Some(frames) = value.get("frames").and_then(Value::as_array) else {
            continue;
        };
        for frame in frames.iter().filter_map(Value::as_object) {
            survey.frame_count += 1;
            survey.frame_keys.extend(frame.keys().cloned());
            if let Some(contours) = frame.get("mouthContours").and_then(Value::as_object) {
                survey.contour_names.extend(contours.keys().cloned());
            }
        }
    }
    survey
}

pub fn survey_files(inputs: &[PathBuf], extension: &str) -> Result<FrameSurvey> {
    let mut survey = FrameSurvey::default();
    for path in resolve_inputs(inputs, extension)? {
        let file = File::open(&path)
            .map_err(|err| PipelineError::new(format!("failed to open {:?}: {err}", path)))?;
        let partial = survey_frames(BufReader::new(file));
        survey.frame_keys.extend(partial.frame_keys);
        survey.contour_names.extend(partial.contour_names);
        survey.frame_count += partial.frame_count;
    }
    Ok(survey)
}
