mod artifacts;
mod encoding;
mod stratify;

pub use artifacts::{SubsetArtifact, LABEL_ENCODING_FILE};
pub use encoding::LabelEncoding;
pub use stratify::stratified_split;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::{Array1, Array2};
use tracing::info;

use crate::types::{FeatureRow, FeatureTable, FEATURE_COLUMNS};
use crate::{PipelineError, Result};

pub const DEFAULT_TEST_FRACTION: f64 = 0.15;
/// Share of trainval held out for validation, about 15% of all attempts.
pub const DEFAULT_VAL_FRACTION: f64 = 0.1765;
pub const DEFAULT_SEED: u64 = 42;

/// One distinct attempt and the label shared by all of its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptEntry {
    pub attempt_id: String,
    pub class_label: String,
}

/// Rows of one split subset together with the model-ready matrices.
#[derive(Debug, Clone)]
pub struct Subset {
    pub name: &'static str,
    pub attempt_ids: BTreeSet<String>,
    pub rows: FeatureTable,
    /// `rows × 6` features in [`FEATURE_COLUMNS`] order.
    pub features: Array2<f32>,
    /// Encoded class id per row, aligned with `features`.
    pub labels: Array1<usize>,
    pub class_attempts: BTreeMap<String, usize>,
}

impl Subset {
    fn collect(
        name: &'static str,
        entries: &[AttemptEntry],
        rows: &[FeatureRow],
        encoding: &LabelEncoding,
    ) -> Result<Self> {
        let attempt_ids: BTreeSet<String> =
            entries.iter().map(|entry| entry.attempt_id.clone()).collect();
        let mut class_attempts = BTreeMap::new();
        for entry in entries {
            *class_attempts.entry(entry.class_label.clone()).or_insert(0) += 1;
        }

        let rows: FeatureTable = rows
            .iter()
            .filter(|row| attempt_ids.contains(&row.attempt_id))
            .cloned()
            .collect();
        let flat: Vec<f32> = rows
            .iter()
            .flat_map(|row| row.features().map(|value| value as f32))
            .collect();
        let features = Array2::from_shape_vec((rows.len(), FEATURE_COLUMNS.len()), flat)
            .map_err(|err| PipelineError::new(format!("invalid {name} feature matrix: {err}")))?;
        let labels = rows
            .iter()
            .map(|row| encoding.encode(&row.class_label))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            attempt_ids,
            rows,
            features,
            labels: Array1::from(labels),
            class_attempts,
        })
    }

    pub fn attempt_count(&self) -> usize {
        self.attempt_ids.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Result of an attempt-level train/val/test split.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub encoding: LabelEncoding,
    pub train: Subset,
    pub val: Subset,
    pub test: Subset,
    pub dropped_rows: usize,
}

impl DatasetSplit {
    pub fn subsets(&self) -> [&Subset; 3] {
        [&self.train, &self.val, &self.test]
    }
}

/// Partitions feature tables by attempt with class-stratified sampling.
#[derive(Debug, Clone, Copy)]
pub struct AttemptSplitter {
    pub test_fraction: f64,
    pub val_fraction: f64,
    pub seed: u64,
}

impl Default for AttemptSplitter {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            val_fraction: DEFAULT_VAL_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl AttemptSplitter {
    pub fn new(test_fraction: f64, val_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            val_fraction,
            seed,
        }
    }

    pub fn split(&self, table: &[FeatureRow]) -> Result<DatasetSplit> {
        let rows = clean_rows(table);
        let dropped_rows = table.len() - rows.len();
        info!(
            kept = rows.len(),
            dropped = dropped_rows,
            "cleaned feature table"
        );
        if rows.is_empty() {
            return Err(PipelineError::new(
                "feature table has no usable rows after cleaning",
            ));
        }

        let encoding = LabelEncoding::fit(rows.iter().map(|row| row.class_label.as_str()))?;
        let attempts = attempt_table(&rows)?;

        let (trainval, test) = stratified_split(
            attempts,
            |entry| entry.class_label.clone(),
            self.test_fraction,
            self.seed,
        )?;
        let (train, val) = stratified_split(
            trainval,
            |entry| entry.class_label.clone(),
            self.val_fraction,
            self.seed,
        )?;

        let split = DatasetSplit {
            train: Subset::collect("train", &train, &rows, &encoding)?,
            val: Subset::collect("val", &val, &rows, &encoding)?,
            test: Subset::collect("test", &test, &rows, &encoding)?,
            encoding,
            dropped_rows,
        };
        for subset in split.subsets() {
            info!(
                subset = subset.name,
                attempts = subset.attempt_count(),
                rows = subset.row_count(),
                classes = ?subset.class_attempts,
                "materialized subset"
            );
        }
        Ok(split)
    }
}

/// Drops rows with a non-finite feature or a missing attempt id or label.
pub fn clean_rows(table: &[FeatureRow]) -> FeatureTable {
    table.iter().filter(|row| row.is_clean()).cloned().collect()
}

/// Distinct attempts in first-seen order. An attempt whose rows disagree on
/// the class label is an error.
pub fn attempt_table(rows: &[FeatureRow]) -> Result<Vec<AttemptEntry>> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut entries = Vec::new();
    for row in rows {
        match seen.get(row.attempt_id.as_str()) {
            Some(label) if *label != row.class_label => {
                return Err(PipelineError::new(format!(
                    "attempt {} carries conflicting labels \"{}\" and \"{}\"",
                    row.attempt_id, label, row.class_label
                )));
            }
            Some(_) => {}
            None => {
                seen.insert(&row.attempt_id, &row.class_label);
                entries.push(AttemptEntry {
                    attempt_id: row.attempt_id.clone(),
                    class_label: row.class_label.clone(),
                });
            }
        }
    }
    Ok(entries)
}
