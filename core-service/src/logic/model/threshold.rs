//! Risk Thresholds
//!
//! Maps the classifier output to a phishing probability and a fixed risk
//! tier. Thresholds are constants, not learned: retraining that changes the
//! meaning of the probability needs a threshold review.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::inference::{Classifier, InferenceError};
use crate::logic::features::FeatureVector;

/// Above this: High
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Above this: Medium
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(probability_phishing: f64) -> Self {
        if probability_phishing > HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if probability_phishing > MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal output of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub url: String,
    /// Rounded to 4 decimal places
    pub probability_phishing: f64,
    pub risk: RiskTier,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ============================================================================
// RISK SCORER
// ============================================================================

/// Classifier plus the index of its benign class
#[derive(Clone)]
pub struct RiskScorer {
    classifier: Arc<dyn Classifier>,
    benign_class: usize,
}

impl RiskScorer {
    pub fn new(classifier: Arc<dyn Classifier>, benign_class: usize) -> Self {
        Self { classifier, benign_class }
    }

    /// `1 - P(benign)`, clamped to [0, 1]
    pub fn probability_phishing(&self, vector: &FeatureVector) -> Result<f64, InferenceError> {
        let probabilities = self.classifier.predict_proba(vector.as_slice())?;
        let benign = probabilities.get(self.benign_class).copied().ok_or(
            InferenceError::ClassOutOfRange {
                index: self.benign_class,
                classes: probabilities.len(),
            },
        )?;
        Ok((1.0 - f64::from(benign)).clamp(0.0, 1.0))
    }

    pub fn score(&self, url: &str, vector: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let probability = self.probability_phishing(vector)?;
        Ok(PredictionResult {
            url: url.to_string(),
            probability_phishing: round4(probability),
            risk: RiskTier::from_probability(probability),
        })
    }
}

impl fmt::Debug for RiskScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskScorer")
            .field("classifier", &self.classifier.name())
            .field("benign_class", &self.benign_class)
            .finish()
    }
}
