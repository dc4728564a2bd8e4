use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DatasetSplit, Subset};
use crate::table::save_table;
use crate::types::FEATURE_COLUMNS;
use crate::{PipelineError, Result};

pub const LABEL_ENCODING_FILE: &str = "label_encoding.json";

/// Model-ready matrices of one subset as handed to a training collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetArtifact {
    pub feature_columns: Vec<String>,
    pub features: Array2<f32>,
    pub labels: Array1<usize>,
}

impl From<&Subset> for SubsetArtifact {
    fn from(subset: &Subset) -> Self {
        Self {
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            features: subset.features.clone(),
            labels: subset.labels.clone(),
        }
    }
}

impl SubsetArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|err| PipelineError::new(format!("failed to open {:?}: {err}", path)))?;
        serde_json::from_reader(file)
            .map_err(|err| PipelineError::new(format!("invalid subset artifact {:?}: {err}", path)))
    }
}

impl DatasetSplit {
    /// Writes `<subset>.csv`, `<subset>.json` per subset plus the label encoding.
    pub fn write_artifacts(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|err| {
            PipelineError::new(format!("failed to create output directory {:?}: {err}", dir))
        })?;
        for subset in self.subsets() {
            save_table(&dir.join(format!("{}.csv", subset.name)), &subset.rows)?;
            let path = dir.join(format!("{}.json", subset.name));
            let file = File::create(&path)
                .map_err(|err| PipelineError::new(format!("failed to create {:?}: {err}", path)))?;
            serde_json::to_writer(BufWriter::new(file), &SubsetArtifact::from(subset)).map_err(
                |err| PipelineError::new(format!("failed to write {:?}: {err}", path)),
            )?;
        }
        self.encoding.save(&dir.join(LABEL_ENCODING_FILE))?;
        info!(dir = %dir.display(), "wrote split artifacts");
        Ok(())
    }
}
