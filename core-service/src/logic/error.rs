//! Error handling
//!
//! Input errors go back to the caller. Fetch and parse failures never reach
//! this type: they degrade to empty content / zero features. Everything
//! else here is an artifact problem and is fatal at load time.

use std::path::PathBuf;

use super::features::layout::SchemaError;
use super::model::inference::InferenceError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or empty URL
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build brand matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse { path: path.into(), source }
    }

    /// True for errors the caller caused (bad request), false for server-side problems
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Read a JSON artifact from disk
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> PipelineResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| PipelineError::parse(path, e))
}

/// Write a JSON artifact to disk (pretty printed)
pub(crate) fn write_json<T: serde::Serialize>(path: &std::path::Path, value: &T) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PipelineError::parse(path, e))?;
    std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
}
