//! Feature Layout - Centralized Feature Schema
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The same schema artifact is used to build the training matrix and the
//! inference vectors. The classifier manifest records its layout hash, so a
//! model is never fed vectors from a different layout.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment the schema version
//! 2. Change order → increment the schema version
//! 3. Remove feature → increment the schema version
//! 4. Change a default or an extraction option → increment the schema version
//!
//! The layout hash covers all of the above, so forgetting the bump is still
//! caught at load time.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::error::{read_json, write_json, PipelineResult};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Version of the built-in schema (`SELECTED_FEATURES`)
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// BUILT-IN SCHEMA
// ============================================================================

/// Features selected for the shipped classifier, in column order.
/// `init-schema` writes this list as the starting schema artifact.
pub const SELECTED_FEATURES: &[&str] = &[
    "text_length",
    "num_img_tags",
    "has_https",
    "path_level",
    "DigitRatioInURL",
    "is_known_brand",
    "CharContinuationRate",
    "num_numeric_chars",
    "tfidf_domain",
    "num_text_words",
    "tfidf_seeing",
    "tfidf_news",
    "tfidf_home",
    "PctExtNullSelfRedirectHyperlinks",
    "tfidf_make",
    "LetterRatioInURL",
    "tfidf_terms",
    "url_length",
    "num_meta_tags",
    "num_script_tags",
    "has_favicon",
    "tfidf_search",
    "PctExtHyperlinks",
    "hostname_length",
    "tfidf_new",
    "tfidf_years",
    "num_external_links",
    "tfidf_privacy",
    "tfidf_media",
    "PctExtResourceUrls",
    "tfidf_events",
    "tfidf_world",
    "entropy",
    "prefix_suffix_in_domain",
    "tfidf_time",
    "tfidf_2025",
    "brand_in_path",
    "tfidf_10",
    "tfidf_2024",
    "tfidf_25",
    "tfidf_best",
    "tfidf_contact",
    "tfidf_deployed",
    "tfidf_facebook",
    "tfidf_finished",
    "tfidf_hosting",
    "NoHttps",
    "num_dash",
    "tfidf_latest",
    "tfidf_policy",
    "tfidf_read",
    "tfidf_reasons",
    "tfidf_refer",
    "tfidf_rights",
    "tfidf_skip",
    "tfidf_view",
    "tfidf_20",
    "tfidf_12",
    "brand_domain_mismatch",
    "iframe_count",
];

// ============================================================================
// EXTRACTION OPTIONS
// ============================================================================

/// Which part of the URL the brand substring scan looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandScope {
    /// The whole lowercased URL, host included
    #[default]
    FullUrl,
    /// Path, query and fragment only
    PathOnly,
}

/// How `tfidf_*` columns are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfidfMode {
    /// L2-normalized TF-IDF weight
    #[default]
    Weighted,
    /// 1 when the weight is positive, else 0
    Binary,
}

/// Settings that change feature values and therefore belong to the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionOptions {
    #[serde(default)]
    pub brand_scope: BrandScope,
    #[serde(default)]
    pub tfidf_mode: TfidfMode,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("feature schema is empty")]
    Empty,

    #[error("feature `{0}` appears more than once in the schema")]
    DuplicateFeature(String),

    #[error("feature `{0}` has a non-finite default")]
    InvalidDefault(String),

    #[error(
        "Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
         got v{actual_version} (hash: {actual_hash:08x})"
    )]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("schema names features no extractor produces: {}", .0.join(", "))]
    UnknownFeatures(Vec<String>),

    #[error("vector length mismatch: schema has {expected} features, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// One schema column and the value it takes when no extractor produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(default)]
    pub default: f32,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), default: 0.0 }
    }
}

/// On-disk form of the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaFile {
    version: u8,
    #[serde(default)]
    options: ExtractionOptions,
    features: Vec<FeatureSpec>,
}

/// Ordered, versioned list of named features the classifier expects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SchemaFile", into = "SchemaFile")]
pub struct FeatureSchema {
    version: u8,
    options: ExtractionOptions,
    features: Vec<FeatureSpec>,
    index: HashMap<String, usize>,
    hash: u32,
}

impl TryFrom<SchemaFile> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(file: SchemaFile) -> Result<Self, Self::Error> {
        Self::new(file.version, file.options, file.features)
    }
}

impl From<FeatureSchema> for SchemaFile {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            version: schema.version,
            options: schema.options,
            features: schema.features,
        }
    }
}

impl FeatureSchema {
    pub fn new(
        version: u8,
        options: ExtractionOptions,
        features: Vec<FeatureSpec>,
    ) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(features.len());
        for (i, spec) in features.iter().enumerate() {
            if !spec.default.is_finite() {
                return Err(SchemaError::InvalidDefault(spec.name.clone()));
            }
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateFeature(spec.name.clone()));
            }
        }

        let hash = compute_layout_hash(version, &options, &features);
        Ok(Self { version, options, features, index, hash })
    }

    /// Schema with every feature defaulting to 0
    pub fn from_names<S: AsRef<str>>(
        version: u8,
        options: ExtractionOptions,
        names: &[S],
    ) -> Result<Self, SchemaError> {
        let features = names.iter().map(|n| FeatureSpec::new(n.as_ref())).collect();
        Self::new(version, options, features)
    }

    /// The built-in schema of the shipped classifier
    pub fn selected() -> Self {
        // SELECTED_FEATURES is non-empty and duplicate-free (see tests)
        Self::from_names(FEATURE_VERSION, ExtractionOptions::default(), SELECTED_FEATURES)
            .unwrap_or_else(|e| unreachable!("built-in schema is invalid: {e}"))
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let schema: Self = read_json(path)?;
        log::info!(
            "Loaded feature schema v{} ({} features, hash {:08x}) from {}",
            schema.version,
            schema.len(),
            schema.hash,
            path.display()
        );
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        write_json(path, self)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// Get feature index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Get feature name by index
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.features.get(index).map(|f| f.name.as_str())
    }

    pub fn layout_hash(&self) -> u32 {
        self.hash
    }

    /// Validate that incoming data matches this layout
    pub fn validate_layout(&self, version: u8, hash: u32) -> Result<(), SchemaError> {
        if version != self.version || hash != self.hash {
            return Err(SchemaError::LayoutMismatch {
                expected_version: self.version,
                expected_hash: self.hash,
                actual_version: version,
                actual_hash: hash,
            });
        }
        Ok(())
    }

    /// Check that every schema column is something the pipeline can emit
    pub fn validate_producible(&self, produced: &BTreeSet<String>) -> Result<(), SchemaError> {
        let unknown: Vec<String> = self
            .names()
            .filter(|name| !produced.contains(*name))
            .map(str::to_string)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::UnknownFeatures(unknown))
        }
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            version: self.version,
            hash: self.hash,
            feature_count: self.len(),
            feature_names: self.names().map(str::to_string).collect(),
        }
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.options == other.options
            && self.features == other.features
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over everything that determines a vector's meaning
fn compute_layout_hash(version: u8, options: &ExtractionOptions, features: &[FeatureSpec]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[version]);
    hasher.update(&[match options.brand_scope {
        BrandScope::FullUrl => 0,
        BrandScope::PathOnly => 1,
    }]);
    hasher.update(&[match options.tfidf_mode {
        TfidfMode::Weighted => 0,
        TfidfMode::Binary => 1,
    }]);

    for spec in features {
        hasher.update(spec.name.as_bytes());
        hasher.update(&[0]); // Separator
        hasher.update(&spec.default.to_le_bytes());
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> FeatureSchema {
        FeatureSchema::from_names(1, ExtractionOptions::default(), &["url_length", "entropy"]).unwrap()
    }

    #[test]
    fn test_selected_schema() {
        let schema = FeatureSchema::selected();
        assert_eq!(schema.len(), SELECTED_FEATURES.len());
        assert_eq!(schema.len(), 60);
        assert_eq!(schema.version(), FEATURE_VERSION);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(small().layout_hash(), small().layout_hash());
        assert_ne!(small().layout_hash(), 0);
    }

    #[test]
    fn test_layout_hash_tracks_order() {
        let swapped =
            FeatureSchema::from_names(1, ExtractionOptions::default(), &["entropy", "url_length"]).unwrap();
        assert_ne!(small().layout_hash(), swapped.layout_hash());
    }

    #[test]
    fn test_layout_hash_tracks_defaults_and_options() {
        let mut features = small().features().to_vec();
        features[1].default = -1.0;
        let with_default = FeatureSchema::new(1, ExtractionOptions::default(), features).unwrap();
        assert_ne!(small().layout_hash(), with_default.layout_hash());

        let path_only = FeatureSchema::from_names(
            1,
            ExtractionOptions { brand_scope: BrandScope::PathOnly, ..Default::default() },
            &["url_length", "entropy"],
        )
        .unwrap();
        assert_ne!(small().layout_hash(), path_only.layout_hash());

        let binary = FeatureSchema::from_names(
            1,
            ExtractionOptions { tfidf_mode: TfidfMode::Binary, ..Default::default() },
            &["url_length", "entropy"],
        )
        .unwrap();
        assert_ne!(small().layout_hash(), binary.layout_hash());
        assert_ne!(path_only.layout_hash(), binary.layout_hash());
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let dup = FeatureSchema::from_names(1, ExtractionOptions::default(), &["a", "b", "a"]);
        assert_eq!(dup.unwrap_err(), SchemaError::DuplicateFeature("a".into()));

        let empty = FeatureSchema::from_names::<&str>(1, ExtractionOptions::default(), &[]);
        assert_eq!(empty.unwrap_err(), SchemaError::Empty);
    }

    #[test]
    fn test_validate_layout() {
        let schema = small();
        assert!(schema.validate_layout(1, schema.layout_hash()).is_ok());
        assert!(schema.validate_layout(2, schema.layout_hash()).is_err());
        assert!(schema.validate_layout(1, schema.layout_hash().wrapping_add(1)).is_err());
    }

    #[test]
    fn test_validate_producible() {
        let schema = small();
        let mut produced: BTreeSet<String> = ["url_length".to_string()].into();
        match schema.validate_producible(&produced) {
            Err(SchemaError::UnknownFeatures(names)) => assert_eq!(names, vec!["entropy"]),
            other => panic!("unexpected: {other:?}"),
        }

        produced.insert("entropy".into());
        assert!(schema.validate_producible(&produced).is_ok());
    }

    #[test]
    fn test_feature_index() {
        let schema = FeatureSchema::selected();
        assert_eq!(schema.index_of("text_length"), Some(0));
        assert_eq!(schema.index_of("iframe_count"), Some(59));
        assert_eq!(schema.index_of("nonexistent"), None);
        assert_eq!(schema.name_at(2), Some("has_https"));
        assert_eq!(schema.name_at(100), None);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let schema = FeatureSchema::selected();
        schema.save(&path).unwrap();

        let loaded = FeatureSchema::load(&path).unwrap();
        assert_eq!(loaded, schema);
        assert_eq!(loaded.layout_hash(), schema.layout_hash());
    }

    #[test]
    fn test_names_only_file_defaults_to_zero() {
        let raw = r#"{"version": 4, "features": [{"name": "url_length"}, {"name": "entropy"}]}"#;
        let schema: FeatureSchema = serde_json::from_str(raw).unwrap();
        assert_eq!(schema.options().brand_scope, BrandScope::FullUrl);
        assert!(schema.features().iter().all(|f| f.default == 0.0));
    }

    #[test]
    fn test_duplicate_in_file_is_rejected() {
        let raw = r#"{"version": 1, "features": [{"name": "a"}, {"name": "a"}]}"#;
        assert!(serde_json::from_str::<FeatureSchema>(raw).is_err());
    }
}
