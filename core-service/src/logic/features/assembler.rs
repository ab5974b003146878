//! Feature Vector Assembler
//!
//! Runs every extractor over a [`UrlRecord`] and projects the union of their
//! outputs onto the [`FeatureSchema`]. The schema decides vector shape:
//! names outside it are dropped, names it lists but nobody produced take the
//! declared default. Content extractors are skipped when the record has no
//! content, so a failed fetch leaves their slots at default.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::html::HtmlFeatures;
use super::keywords::KeywordLists;
use super::layout::FeatureSchema;
use super::record::UrlRecord;
use super::text::TextFeatures;
use super::tfidf::{LexicalVocabulary, TfidfFeatures};
use super::trust::{TrustFeatures, TrustedDomainSet};
use super::url::UrlFeatures;
use super::vector::{FeatureExtractor, FeatureSet, FeatureVector};
use crate::logic::error::PipelineResult;

pub struct FeaturePipeline {
    schema: Arc<FeatureSchema>,
    extractors: Vec<Box<dyn FeatureExtractor>>,
}

impl FeaturePipeline {
    /// Standard pipeline: url, trust, html, text, tfidf.
    ///
    /// Fails when the schema names a feature none of the extractors emit.
    pub fn new(
        schema: Arc<FeatureSchema>,
        trusted: Arc<TrustedDomainSet>,
        vocabulary: Arc<LexicalVocabulary>,
        keywords: Arc<KeywordLists>,
    ) -> PipelineResult<Self> {
        let options = *schema.options();
        let extractors: Vec<Box<dyn FeatureExtractor>> = vec![
            Box::new(UrlFeatures::new(keywords.clone())),
            Box::new(TrustFeatures::new(trusted, options.brand_scope)),
            Box::new(HtmlFeatures),
            Box::new(TextFeatures::new(keywords)),
            Box::new(TfidfFeatures::new(vocabulary, options.tfidf_mode)),
        ];
        Self::with_extractors(schema, extractors)
    }

    pub fn with_extractors(
        schema: Arc<FeatureSchema>,
        extractors: Vec<Box<dyn FeatureExtractor>>,
    ) -> PipelineResult<Self> {
        let pipeline = Self { schema, extractors };
        pipeline.schema.validate_producible(&pipeline.produced_features())?;
        Ok(pipeline)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Every name the extractors can emit
    pub fn produced_features(&self) -> BTreeSet<String> {
        self.extractors
            .iter()
            .flat_map(|e| e.feature_names())
            .collect()
    }

    /// Union of extractor outputs before schema projection
    pub fn extract_named(&self, record: &UrlRecord) -> FeatureSet {
        let mut set = FeatureSet::new();
        for extractor in &self.extractors {
            if extractor.requires_content() && !record.has_content() {
                log::trace!("Skipping {} for {}: no content", extractor.id(), record.url());
                continue;
            }
            extractor.extract(record, &mut set);
        }
        set
    }

    /// Complete vector over the schema
    pub fn extract(&self, record: &UrlRecord) -> FeatureVector {
        FeatureVector::from_feature_set(&self.schema, &self.extract_named(record))
    }
}

impl std::fmt::Debug for FeaturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturePipeline")
            .field("schema_version", &self.schema.version())
            .field("layout_hash", &format_args!("{:08x}", self.schema.layout_hash()))
            .field("extractors", &self.extractors.iter().map(|e| e.id()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::error::PipelineError;
    use crate::logic::features::layout::{ExtractionOptions, SchemaError};

    fn pipeline(names: &[&str]) -> PipelineResult<FeaturePipeline> {
        let schema = FeatureSchema::from_names(1, ExtractionOptions::default(), names)?;
        FeaturePipeline::new(
            Arc::new(schema),
            Arc::new(TrustedDomainSet::empty()),
            Arc::new(LexicalVocabulary::fit(["bank login"], 10)),
            Arc::new(KeywordLists::default()),
        )
    }

    #[test]
    fn test_unknown_schema_feature_is_rejected() {
        let err = pipeline(&["url_length", "tfidf_missing"]).unwrap_err();
        match err {
            PipelineError::Schema(SchemaError::UnknownFeatures(names)) => {
                assert_eq!(names, vec!["tfidf_missing"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_vector_follows_schema_order() {
        let p = pipeline(&["tfidf_bank", "url_length", "has_favicon"]).unwrap();
        let record = UrlRecord::new("https://a.com")
            .unwrap()
            .with_content(r#"<link rel="icon" href="/f.ico"><p>bank</p>"#);

        let v = p.extract(&record);
        assert_eq!(v.values, vec![1.0, 13.0, 1.0]);
        assert_eq!(v.layout_hash, p.schema().layout_hash());
    }

    #[test]
    fn test_content_extractors_skipped_without_content() {
        let p = pipeline(&["url_length", "num_img_tags"]).unwrap();
        let named = p.extract_named(&UrlRecord::new("https://a.com").unwrap());
        assert!(named.contains("url_length"));
        assert!(!named.contains("num_img_tags"));
        assert!(!named.contains("text_length"));
        assert!(!named.contains("tfidf_bank"));
    }

    #[test]
    fn test_produced_catalog() {
        let p = pipeline(&["url_length"]).unwrap();
        let produced = p.produced_features();
        for name in ["entropy", "is_known_brand", "iframe_count", "text_length", "tfidf_login"] {
            assert!(produced.contains(name), "{name}");
        }
    }
}
