//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every path can be overridden with a `PHISHGUARD_*` environment variable.

use std::time::Duration;

/// Default feature schema artifact
pub const DEFAULT_SCHEMA_PATH: &str = "models/feature_schema.json";

/// Default TF-IDF vocabulary artifact
pub const DEFAULT_VOCABULARY_PATH: &str = "models/tfidf_vocabulary.json";

/// Default ONNX classifier
pub const DEFAULT_MODEL_PATH: &str = "models/classifier.onnx";

/// Default classifier manifest
pub const DEFAULT_MANIFEST_PATH: &str = "models/classifier.manifest.json";

/// Default trusted domain list (one registrable domain per line)
pub const DEFAULT_TRUSTED_DOMAINS_PATH: &str = "data/external/tranco_top_10000.txt";

/// Default keyword list directory
pub const DEFAULT_KEYWORDS_DIR: &str = "data/keywords";

/// Default page fetch timeout (seconds)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Largest page body kept for analysis
pub const DEFAULT_MAX_CONTENT_BYTES: u64 = 5 * 1024 * 1024;

/// User agent sent by the content fetcher
pub const FETCH_USER_AGENT: &str = concat!("PhishGuard/", env!("CARGO_PKG_VERSION"));

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "PhishGuard";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get feature schema path from environment or use default
pub fn get_schema_path() -> String {
    env_or("PHISHGUARD_SCHEMA", DEFAULT_SCHEMA_PATH)
}

/// Get vocabulary path from environment or use default
pub fn get_vocabulary_path() -> String {
    env_or("PHISHGUARD_VOCABULARY", DEFAULT_VOCABULARY_PATH)
}

/// Get classifier path from environment or use default
pub fn get_model_path() -> String {
    env_or("PHISHGUARD_MODEL", DEFAULT_MODEL_PATH)
}

/// Get classifier manifest path from environment or use default
pub fn get_manifest_path() -> String {
    env_or("PHISHGUARD_MANIFEST", DEFAULT_MANIFEST_PATH)
}

/// Get trusted domain list path from environment or use default
pub fn get_trusted_domains_path() -> String {
    env_or("PHISHGUARD_TRUSTED_DOMAINS", DEFAULT_TRUSTED_DOMAINS_PATH)
}

/// Get keyword directory from environment or use default
pub fn get_keywords_dir() -> String {
    env_or("PHISHGUARD_KEYWORDS_DIR", DEFAULT_KEYWORDS_DIR)
}

/// Get fetch timeout from environment or use default
pub fn get_fetch_timeout() -> Duration {
    let secs = std::env::var("PHISHGUARD_FETCH_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Check if live page fetching is enabled
pub fn is_fetch_enabled() -> bool {
    std::env::var("PHISHGUARD_FETCH_ENABLED")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
