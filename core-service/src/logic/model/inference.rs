//! Inference Engine - ONNX Runtime Integration
//!
//! The classifier is opaque: given a vector in schema order it returns one
//! probability per class. The shipped artifact is an ONNX export of the
//! trained model (probabilities as a `[1, n_classes]` float tensor).

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Run(String),

    #[error("model output `{0}` missing")]
    MissingOutput(String),

    #[error("class index {index} out of range ({classes} classes)")]
    ClassOutOfRange { index: usize, classes: usize },
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for classifier backends (ONNX, test doubles)
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// One probability per class for a single vector
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError>;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    /// `Session::run` needs `&mut`
    session: Mutex<Session>,
    output_name: String,
    path: PathBuf,
}

impl OnnxClassifier {
    /// Load an ONNX model. `output_name` is the probability tensor
    /// (`probabilities` for skl2onnx exports with zipmap disabled).
    pub fn load(path: &Path, output_name: &str) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", path.display());

        if !path.exists() {
            return Err(InferenceError::ModelNotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("optimization: {e}")))?
            .commit_from_file(path)
            .map_err(|e| InferenceError::Load(e.to_string()))?;

        if !session.outputs.iter().any(|o| o.name == output_name) {
            return Err(InferenceError::MissingOutput(output_name.to_string()));
        }

        log::info!("ONNX model loaded successfully");
        Ok(Self {
            session: Mutex::new(session),
            output_name: output_name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("onnx")
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError::Run(format!("array error: {e}")))?;
        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Run(format!("tensor error: {e}")))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::MissingOutput(self.output_name.clone()))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Run(format!("extract error: {e}")))?;

        Ok(data.to_vec())
    }
}

/// Fixed output, for tests
#[cfg(test)]
pub(crate) struct FixedClassifier(pub Vec<f32>);

#[cfg(test)]
impl Classifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let err = OnnxClassifier::load(Path::new("does/not/exist.onnx"), "probabilities")
            .err()
            .unwrap();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }
}
