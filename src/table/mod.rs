//! Delimited-text persistence for feature tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::types::{FeatureRow, FeatureTable};
use crate::{PipelineError, Result};

/// Column order of the feature table artifact.
pub const TABLE_COLUMNS: [&str; 11] = [
    "attempt_id",
    "phoneme",
    "class_label",
    "timestamp",
    "frame_index",
    "lip_gap_norm",
    "mouth_height_norm",
    "round_ratio",
    "lip_gap_prev_norm",
    "lip_gap_delta_norm",
    "mouth_height_delta_norm",
];

pub fn write_table(writer: impl Write, rows: &[FeatureRow]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv.write_record(TABLE_COLUMNS).map_err(table_error)?;
    }
    for row in rows {
        csv.serialize(row).map_err(table_error)?;
    }
    csv.flush()
        .map_err(|err| PipelineError::new(format!("failed to flush feature table: {err}")))
}

pub fn read_table(reader: impl Read) -> Result<FeatureTable> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().map_err(table_error)?.clone();
    if let Some(missing) = TABLE_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(PipelineError::new(format!(
            "feature table is missing required column \"{missing}\""
        )));
    }
    csv.deserialize::<FeatureRow>()
        .enumerate()
        .map(|(idx, record)| {
            record.map_err(|err| {
                PipelineError::new(format!("invalid feature table row {}: {err}", idx + 1))
            })
        })
        .collect()
}

pub fn save_table(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    let file = File::create(path)
        .map_err(|err| PipelineError::new(format!("failed to create {:?}: {err}", path)))?;
    write_table(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote feature table");
    Ok(())
}

pub fn load_table(path: &Path) -> Result<FeatureTable> {
    let file = File::open(path)
        .map_err(|err| PipelineError::new(format!("failed to open {:?}: {err}", path)))?;
    let rows = read_table(file)?;
    info!(path = %path.display(), rows = rows.len(), "loaded feature table");
    Ok(rows)
}

fn table_error(err: csv::Error) -> PipelineError {
    PipelineError::new(format!("feature table error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(attempt_id: &str, round_ratio: f64) -> FeatureRow {
        FeatureRow {
            attempt_id: attempt_id.to_string(),
            phoneme: "A".to_string(),
            class_label: "good".to_string(),
            timestamp: Some(0.25),
            frame_index: Some(4),
            lip_gap_norm: 0.2,
            mouth_height_norm: 0.5,
            round_ratio,
            lip_gap_prev_norm: 0.2,
            lip_gap_delta_norm: 0.0,
            mouth_height_delta_norm: 0.0,
        }
    }

    #[test]
    fn writes_header_in_column_order() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &[row("a1", 2.0)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, TABLE_COLUMNS.join(","));
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim(), TABLE_COLUMNS.join(","));
    }

    #[test]
    fn infinite_ratio_survives_persistence() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &[row("a1", f64::INFINITY)]).unwrap();
        let rows = read_table(buffer.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].round_ratio.is_infinite());
        assert!(!rows[0].is_clean());
    }

    #[test]
    fn empty_cells_read_as_missing() {
        let text = format!(
            "{}\n,A,good,,,0.1,0.2,,0.1,0.0,0.0\n",
            TABLE_COLUMNS.join(",")
        );
        let rows = read_table(text.as_bytes()).unwrap();
        assert_eq!(rows[0].attempt_id, "");
        assert_eq!(rows[0].timestamp, None);
        assert!(rows[0].round_ratio.is_nan());
    }

    #[test]
    fn missing_column_is_fatal() {
        let text = "attempt_id,phoneme,lip_gap_norm\na,A,0.1\n";
        let err = read_table(text.as_bytes()).unwrap_err();
        assert!(err.message().contains("class_label"));
    }
}
