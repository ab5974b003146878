//! Features Module - Feature Extraction Engine
//!
//! Each extractor writes named values; the assembler projects them onto the
//! schema. Add or change a feature here without touching the scorer.

pub mod record;
pub mod url;
pub mod trust;
pub mod html;
pub mod text;
pub mod tfidf;
pub mod keywords;
pub mod layout;
pub mod vector;
pub mod assembler;

#[cfg(test)]
mod tests;

// Re-export common types
pub use assembler::FeaturePipeline;
pub use keywords::KeywordLists;
pub use layout::{BrandScope, ExtractionOptions, FeatureSchema, FeatureSpec, SchemaError, TfidfMode};
pub use record::{normalize_url, UrlRecord};
pub use tfidf::LexicalVocabulary;
pub use trust::TrustedDomainSet;
pub use vector::{FeatureExtractor, FeatureSet, FeatureVector};
