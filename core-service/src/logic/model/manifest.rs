//! Classifier Manifest
//!
//! Written next to the ONNX file when the model is exported. Records which
//! schema layout, vocabulary and keyword lists the model was trained
//! against, so a mismatch is caught at load time instead of producing
//! confidently wrong scores.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logic::error::{read_json, write_json, PipelineError, PipelineResult};
use crate::logic::features::{FeatureSchema, KeywordLists, LexicalVocabulary};

fn default_output() -> String {
    "probabilities".to_string()
}

fn default_benign_class() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierManifest {
    /// e.g. "random_forest"
    pub model_type: String,
    pub schema_version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,
    pub vocabulary_checksum: String,
    /// See `KeywordLists::checksum`
    pub keywords_checksum: String,
    /// Class index of "benign" (label 1 in the training corpus)
    #[serde(default = "default_benign_class")]
    pub benign_class_index: usize,
    /// Name of the probability output tensor
    #[serde(default = "default_output")]
    pub probability_output: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}

impl ClassifierManifest {
    /// Manifest for a model trained on `schema`, `vocabulary` and `keywords`
    pub fn for_artifacts(
        model_type: impl Into<String>,
        schema: &FeatureSchema,
        vocabulary: &LexicalVocabulary,
        keywords: &KeywordLists,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            schema_version: schema.version(),
            layout_hash: schema.layout_hash(),
            feature_count: schema.len(),
            vocabulary_checksum: vocabulary.checksum().to_string(),
            keywords_checksum: keywords.checksum(),
            benign_class_index: default_benign_class(),
            probability_output: default_output(),
            trained_at: chrono::Utc::now(),
        }
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        write_json(path, self)
    }

    /// Refuse to serve when the model was trained on other artifacts
    pub fn check_compatible(
        &self,
        schema: &FeatureSchema,
        vocabulary: &LexicalVocabulary,
        keywords: &KeywordLists,
    ) -> PipelineResult<()> {
        schema.validate_layout(self.schema_version, self.layout_hash)?;

        if self.feature_count != schema.len() {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model expects {} features, schema has {}",
                self.feature_count,
                schema.len()
            )));
        }

        if self.vocabulary_checksum != vocabulary.checksum() {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model trained with vocabulary {}, loaded vocabulary is {} ({})",
                self.vocabulary_checksum,
                vocabulary.checksum(),
                vocabulary.version
            )));
        }

        let loaded = keywords.checksum();
        if self.keywords_checksum != loaded {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model trained with keyword lists {}, loaded lists are {}",
                self.keywords_checksum, loaded
            )));
        }

        Ok(())
    }
}
