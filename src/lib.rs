//! Lip geometry features from recorded mouth-contour landmarks, and
//! attempt-aware dataset splitting for a pronunciation quality classifier.

pub mod cli;
pub mod config;
pub mod features;
pub mod ingest;
pub mod split;
pub mod table;
pub mod types;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Convenient alias for results returned by the pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Lightweight error type shared by ingestion, extraction and splitting.
#[derive(Debug, Clone)]
pub struct PipelineError {
    message: Arc<str>,
}

impl PipelineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for PipelineError {}
