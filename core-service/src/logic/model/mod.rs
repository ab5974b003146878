//! Model Module - Classifier Inference & Risk Scoring
//!
//! Tách phần suy luận khỏi phần trích xuất đặc trưng.
//! The scorer only ever sees an assembled vector.

pub mod inference;
pub mod manifest;
pub mod threshold;

// Re-export common types
pub use inference::{Classifier, InferenceError, OnnxClassifier};
pub use manifest::ClassifierManifest;
pub use threshold::{PredictionResult, RiskScorer, RiskTier};
