//! PhishGuard Core - URL feature extraction and phishing risk scoring
//!
//! # Architecture
//!
//! ```text
//! URL ──► UrlRecord ──┬──► url / trust ─────────────────────┐
//!                     │                                     ▼
//!         Fetcher ────┴──► html / text / tfidf ──► Assembler (FeatureSchema)
//!                                                           │
//!                                                           ▼
//!                                       Classifier ──► Risk Scorer ──► PredictionResult
//! ```
//!
//! Every artifact (schema, trusted domains, vocabulary, keyword lists,
//! classifier) is loaded once and shared read-only.

pub mod constants;
pub mod logic;

pub use logic::engine::PhishingEngine;
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::features::{FeaturePipeline, FeatureSchema, FeatureVector, UrlRecord};
pub use logic::model::{PredictionResult, RiskTier};
