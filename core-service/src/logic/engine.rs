//! Phishing Engine
//!
//! Loads every artifact once, checks they belong together, then serves
//! `predict(url)`: normalize → fetch → extract → score. All state is
//! read-only after load, so one engine can be shared across threads.

use std::sync::Arc;

use super::config::EngineConfig;
use super::error::PipelineResult;
use super::fetch::{ContentFetcher, HttpFetcher, OfflineFetcher};
use super::features::{
    FeaturePipeline, FeatureSchema, FeatureVector, KeywordLists, LexicalVocabulary,
    TrustedDomainSet, UrlRecord,
};
use super::model::{ClassifierManifest, Classifier, OnnxClassifier, PredictionResult, RiskScorer};

/// Read-only artifacts the feature pipeline is built from
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub schema: Arc<FeatureSchema>,
    pub trusted: Arc<TrustedDomainSet>,
    pub vocabulary: Arc<LexicalVocabulary>,
    pub keywords: Arc<KeywordLists>,
}

impl Artifacts {
    /// Load schema, trust list, vocabulary and keyword lists
    pub fn load(config: &EngineConfig) -> PipelineResult<Self> {
        let keywords = match &config.keywords_dir {
            Some(dir) => KeywordLists::load(dir)?,
            None => {
                log::warn!("No keywords directory configured, keyword features will be zero");
                KeywordLists::default()
            }
        };
        Ok(Self {
            schema: Arc::new(FeatureSchema::load(&config.schema_path)?),
            trusted: Arc::new(TrustedDomainSet::load(&config.trusted_domains_path)?),
            vocabulary: Arc::new(LexicalVocabulary::load(&config.vocabulary_path)?),
            keywords: Arc::new(keywords),
        })
    }

    /// Manifest for a model trained against these artifacts
    pub fn manifest(&self, model_type: impl Into<String>) -> ClassifierManifest {
        ClassifierManifest::for_artifacts(
            model_type,
            &self.schema,
            &self.vocabulary,
            &self.keywords,
        )
    }

    pub fn pipeline(&self) -> PipelineResult<FeaturePipeline> {
        FeaturePipeline::new(
            self.schema.clone(),
            self.trusted.clone(),
            self.vocabulary.clone(),
            self.keywords.clone(),
        )
    }
}

pub struct PhishingEngine {
    pipeline: FeaturePipeline,
    scorer: RiskScorer,
    fetcher: Box<dyn ContentFetcher>,
}

impl PhishingEngine {
    /// Load everything named by `config`. Any incompatibility is fatal.
    pub fn load(config: &EngineConfig) -> PipelineResult<Self> {
        let artifacts = Artifacts::load(config)?;
        let manifest = ClassifierManifest::load(&config.manifest_path)?;
        let classifier = OnnxClassifier::load(&config.model_path, &manifest.probability_output)?;

        let fetcher: Box<dyn ContentFetcher> = if config.fetch_enabled {
            Box::new(HttpFetcher::new(config.fetch_timeout, config.max_content_bytes))
        } else {
            log::info!("Page fetching disabled, scoring from URL features only");
            Box::new(OfflineFetcher)
        };

        Self::from_parts(artifacts, &manifest, Arc::new(classifier), fetcher)
    }

    /// Assemble an engine from loaded parts, validating compatibility
    pub fn from_parts(
        artifacts: Artifacts,
        manifest: &ClassifierManifest,
        classifier: Arc<dyn Classifier>,
        fetcher: Box<dyn ContentFetcher>,
    ) -> PipelineResult<Self> {
        artifacts.vocabulary.verify()?;
        let pipeline = artifacts.pipeline()?;
        manifest.check_compatible(&artifacts.schema, &artifacts.vocabulary, &artifacts.keywords)?;

        log::info!(
            "Engine ready: schema v{} ({} features, {:08x}), vocabulary {} terms, {} trusted domains, model {}",
            artifacts.schema.version(),
            artifacts.schema.len(),
            artifacts.schema.layout_hash(),
            artifacts.vocabulary.len(),
            artifacts.trusted.len(),
            manifest.model_type
        );

        Ok(Self {
            pipeline,
            scorer: RiskScorer::new(classifier, manifest.benign_class_index),
            fetcher,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.pipeline.schema()
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Normalize and fetch: the record the features are computed from
    pub fn build_record(&self, raw_url: &str) -> PipelineResult<UrlRecord> {
        let record = UrlRecord::new(raw_url)?;
        let content = self.fetcher.fetch(record.url());
        log::debug!("{}: {} bytes of content", record.url(), content.len());
        Ok(record.with_content(content))
    }

    pub fn extract(&self, raw_url: &str) -> PipelineResult<FeatureVector> {
        let record = self.build_record(raw_url)?;
        Ok(self.pipeline.extract(&record))
    }

    pub fn predict(&self, raw_url: &str) -> PipelineResult<PredictionResult> {
        let record = self.build_record(raw_url)?;
        let vector = self.pipeline.extract(&record);
        let result = self.scorer.score(record.url(), &vector)?;

        log::info!(
            "{} → {} (p_phishing={:.4}, content={})",
            result.url,
            result.risk,
            result.probability_phishing,
            record.has_content()
        );
        Ok(result)
    }
}

impl std::fmt::Debug for PhishingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhishingEngine")
            .field("pipeline", &self.pipeline)
            .field("scorer", &self.scorer)
            .finish()
    }
}
