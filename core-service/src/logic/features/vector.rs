//! Feature Vector - Core data structure for ML input
//!
//! **Versioned feature vector with layout validation**
//!
//! Extractors write named values into a [`FeatureSet`]. Only the assembler
//! turns a set into a [`FeatureVector`], and it does so through the schema:
//! the schema decides length and order, never the extractors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::layout::{FeatureSchema, SchemaError};
use super::record::UrlRecord;

// ============================================================================
// NAMED FEATURE SET
// ============================================================================

/// Union of extractor outputs, keyed by feature name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    values: BTreeMap<String, f32>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), value);
    }

    pub fn insert_count(&mut self, name: impl Into<String>, count: usize) {
        self.insert(name, count as f32);
    }

    pub fn insert_flag(&mut self, name: impl Into<String>, flag: bool) {
        self.insert(name, if flag { 1.0 } else { 0.0 });
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for feature extractors
pub trait FeatureExtractor: Send + Sync {
    /// Short identifier used in logs
    fn id(&self) -> &'static str;

    /// Every name this extractor can write
    fn feature_names(&self) -> Vec<String>;

    /// Content extractors only run when the record carries page content
    fn requires_content(&self) -> bool {
        false
    }

    /// Extract features and add them to the set
    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet);
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
///
/// One slot per schema entry, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Schema version
    pub version: u8,
    /// CRC32 hash of the schema layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in schema order
    pub values: Vec<f32>,
}

impl FeatureVector {
    /// Every slot at its schema default
    pub fn defaults(schema: &FeatureSchema) -> Self {
        Self {
            version: schema.version(),
            layout_hash: schema.layout_hash(),
            values: schema.features().iter().map(|f| f.default).collect(),
        }
    }

    /// Project a named set onto the schema. Unknown names are dropped,
    /// missing names take the declared default.
    pub fn from_feature_set(schema: &FeatureSchema, set: &FeatureSet) -> Self {
        let values = schema
            .features()
            .iter()
            .map(|spec| set.get(&spec.name).unwrap_or(spec.default))
            .collect();

        Self {
            version: schema.version(),
            layout_hash: schema.layout_hash(),
            values,
        }
    }

    /// Rebuild a vector from stored values (dataset records)
    pub fn from_values(schema: &FeatureSchema, values: Vec<f32>) -> Result<Self, SchemaError> {
        if values.len() != schema.len() {
            return Err(SchemaError::LengthMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            version: schema.version(),
            layout_hash: schema.layout_hash(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f32> {
        schema.index_of(name).and_then(|i| self.get(i))
    }

    /// Validate that this vector was built against `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> Result<(), SchemaError> {
        schema.validate_layout(self.version, self.layout_hash)?;
        if self.values.len() != schema.len() {
            return Err(SchemaError::LengthMismatch {
                expected: schema.len(),
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": self.values,
            "named_values": schema.names()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::{ExtractionOptions, FeatureSpec};

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            2,
            ExtractionOptions::default(),
            vec![
                FeatureSpec::new("url_length"),
                FeatureSpec { name: "text_length".into(), default: -1.0 },
                FeatureSpec::new("entropy"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_follow_schema() {
        let vector = FeatureVector::defaults(&schema());
        assert_eq!(vector.values, vec![0.0, -1.0, 0.0]);
        assert_eq!(vector.version, 2);
        assert_eq!(vector.layout_hash, schema().layout_hash());
    }

    #[test]
    fn test_from_feature_set_drops_unknown_and_defaults_missing() {
        let mut set = FeatureSet::new();
        set.insert("entropy", 3.5);
        set.insert_count("url_length", 20);
        set.insert_flag("not_in_schema", true);

        let vector = FeatureVector::from_feature_set(&schema(), &set);
        assert_eq!(vector.values, vec![20.0, -1.0, 3.5]);
        assert_eq!(vector.get_by_name(&schema(), "entropy"), Some(3.5));
        assert_eq!(vector.get_by_name(&schema(), "not_in_schema"), None);
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(FeatureVector::from_values(&schema(), vec![1.0, 2.0, 3.0]).is_ok());
        assert_eq!(
            FeatureVector::from_values(&schema(), vec![1.0]).unwrap_err(),
            SchemaError::LengthMismatch { expected: 3, actual: 1 }
        );
    }

    #[test]
    fn test_validate_detects_foreign_layout() {
        let mut vector = FeatureVector::defaults(&schema());
        assert!(vector.validate(&schema()).is_ok());

        vector.layout_hash ^= 1;
        assert!(vector.validate(&schema()).is_err());
    }

    #[test]
    fn test_to_log_entry() {
        let vector = FeatureVector::defaults(&schema());
        let log = vector.to_log_entry(&schema());
        assert_eq!(log["feature_version"], 2);
        assert_eq!(log["named_values"]["text_length"], -1.0);
    }
}
