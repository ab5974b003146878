//! Engine Configuration
//!
//! Artifact locations and fetch policy. Built from the environment
//! (see `crate::constants`) or directly by the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Feature schema artifact (JSON)
    pub schema_path: PathBuf,

    /// Trusted domain list (newline-delimited)
    pub trusted_domains_path: PathBuf,

    /// TF-IDF vocabulary artifact (JSON)
    pub vocabulary_path: PathBuf,

    /// Keyword list directory, `None` disables keyword features
    pub keywords_dir: Option<PathBuf>,

    /// ONNX classifier
    pub model_path: PathBuf,

    /// Classifier manifest (JSON)
    pub manifest_path: PathBuf,

    /// Page fetch timeout
    pub fetch_timeout: Duration,

    /// Largest page body kept for analysis
    pub max_content_bytes: u64,

    /// When false, every URL is scored from its lexical features only
    pub fetch_enabled: bool,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let keywords_dir = PathBuf::from(constants::get_keywords_dir());
        Self {
            schema_path: constants::get_schema_path().into(),
            trusted_domains_path: constants::get_trusted_domains_path().into(),
            vocabulary_path: constants::get_vocabulary_path().into(),
            keywords_dir: keywords_dir.is_dir().then_some(keywords_dir),
            model_path: constants::get_model_path().into(),
            manifest_path: constants::get_manifest_path().into(),
            fetch_timeout: constants::get_fetch_timeout(),
            max_content_bytes: constants::DEFAULT_MAX_CONTENT_BYTES,
            fetch_enabled: constants::is_fetch_enabled(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_path: constants::DEFAULT_SCHEMA_PATH.into(),
            trusted_domains_path: constants::DEFAULT_TRUSTED_DOMAINS_PATH.into(),
            vocabulary_path: constants::DEFAULT_VOCABULARY_PATH.into(),
            keywords_dir: None,
            model_path: constants::DEFAULT_MODEL_PATH.into(),
            manifest_path: constants::DEFAULT_MANIFEST_PATH.into(),
            fetch_timeout: Duration::from_secs(constants::DEFAULT_FETCH_TIMEOUT_SECS),
            max_content_bytes: constants::DEFAULT_MAX_CONTENT_BYTES,
            fetch_enabled: true,
        }
    }
}
