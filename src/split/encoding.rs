use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

/// Dense label → integer mapping. Classes are numbered in sorted order, so the
/// same label set always yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    classes: Vec<String>,
}

impl LabelEncoding {
    pub fn fit<I>(labels: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut classes = BTreeSet::new();
        for label in labels {
            let label = label.as_ref();
            if label.trim().is_empty() {
                return Err(PipelineError::new(
                    "cannot encode a missing class label",
                ));
            }
            classes.insert(label.to_string());
        }
        if classes.is_empty() {
            return Err(PipelineError::new("no class labels to encode"));
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map_err(|_| PipelineError::new(format!("unknown class label \"{label}\"")))
    }

    pub fn decode(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|err| PipelineError::new(format!("failed to create {:?}: {err}", path)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|err| PipelineError::new(format!("failed to write label encoding: {err}")))
    }

    /// Reloads a saved encoding, e.g. to encode labels at inference time.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|err| PipelineError::new(format!("failed to open {:?}: {err}", path)))?;
        let encoding: Self = serde_json::from_reader(file)
            .map_err(|err| PipelineError::new(format!("invalid label encoding: {err}")))?;
        let sorted = encoding.classes.windows(2).all(|pair| pair[0] < pair[1]);
        if encoding.classes.is_empty() || !sorted {
            return Err(PipelineError::new(
                "label encoding must list distinct classes in sorted order",
            ));
        }
        Ok(encoding)
    }
}
