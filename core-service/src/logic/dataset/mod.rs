//! Dataset Module - Offline Feature Extraction
//!
//! Builds the training matrix with the same pipeline that serves inference:
//!
//! ```text
//! corpus.csv ──► extract (rayon) ──► shard_*.jsonl ──► merge by URL ──► matrix.csv
//! ```
//!
//! Rows are independent. Shards are joined on the URL, never by position.

pub mod corpus;
pub mod batch;
pub mod writer;
pub mod merge;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logic::features::{FeatureSchema, FeatureVector, SchemaError};

pub use batch::extract_corpus;
pub use corpus::{read_corpus, CorpusRow};
pub use merge::{export_csv, merge_shards};
pub use writer::{read_records, DatasetWriter};

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bad record in {path} line {line}: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("conflicting records for {0}")]
    Conflict(String),
}

impl DatasetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// One extracted corpus row. `label` 1 = benign, 0 = phishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub url: String,
    pub label: u8,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub features: Vec<f32>,
}

impl DatasetRecord {
    pub fn new(url: impl Into<String>, label: u8, vector: FeatureVector) -> Self {
        Self {
            url: url.into(),
            label,
            feature_version: vector.version,
            layout_hash: vector.layout_hash,
            features: vector.values,
        }
    }

    /// The stored values as a vector of `schema`, if they belong to it
    pub fn vector(&self, schema: &FeatureSchema) -> Result<FeatureVector, SchemaError> {
        schema.validate_layout(self.feature_version, self.layout_hash)?;
        FeatureVector::from_values(schema, self.features.clone())
    }
}
