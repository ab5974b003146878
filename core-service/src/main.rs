//! PhishGuard CLI - offline artifact tooling and one-shot predictions

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use phishguard_core::constants;
use phishguard_core::logic::config::EngineConfig;
use phishguard_core::logic::dataset::{self, corpus::visible_texts, DatasetWriter};
use phishguard_core::logic::engine::{Artifacts, PhishingEngine};
use phishguard_core::logic::features::keywords::DEFAULT_KEYWORD_LIMIT;
use phishguard_core::logic::features::layout::{FEATURE_VERSION, SELECTED_FEATURES};
use phishguard_core::logic::features::tfidf::DEFAULT_MAX_FEATURES;
use phishguard_core::logic::features::{
    BrandScope, ExtractionOptions, FeatureSchema, KeywordLists, LexicalVocabulary, TfidfMode,
};
use phishguard_core::logic::fetch::{ContentFetcher, HttpFetcher};

#[derive(Parser)]
#[command(name = "phishguard", version, about = "URL phishing feature extraction and scoring")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Artifact locations, overridable through `PHISHGUARD_*` variables
#[derive(Args)]
struct ArtifactArgs {
    #[arg(long, env = "PHISHGUARD_SCHEMA", default_value = constants::DEFAULT_SCHEMA_PATH)]
    schema: PathBuf,

    #[arg(long, env = "PHISHGUARD_TRUSTED_DOMAINS", default_value = constants::DEFAULT_TRUSTED_DOMAINS_PATH)]
    trusted_domains: PathBuf,

    #[arg(long, env = "PHISHGUARD_VOCABULARY", default_value = constants::DEFAULT_VOCABULARY_PATH)]
    vocabulary: PathBuf,

    /// Keyword list directory (missing directory = empty lists)
    #[arg(long, env = "PHISHGUARD_KEYWORDS_DIR", default_value = constants::DEFAULT_KEYWORDS_DIR)]
    keywords_dir: PathBuf,
}

#[derive(Args)]
struct ModelArgs {
    #[arg(long, env = "PHISHGUARD_MODEL", default_value = constants::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    #[arg(long, env = "PHISHGUARD_MANIFEST", default_value = constants::DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Score from URL features only
    #[arg(long)]
    offline: bool,

    /// Page fetch timeout in seconds
    #[arg(long, env = "PHISHGUARD_FETCH_TIMEOUT", default_value_t = constants::DEFAULT_FETCH_TIMEOUT_SECS)]
    timeout: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    FullUrl,
    PathOnly,
}

#[derive(Clone, Copy, ValueEnum)]
enum TfidfArg {
    Weighted,
    Binary,
}

#[derive(Subcommand)]
enum Command {
    /// Write the built-in feature schema
    InitSchema {
        #[arg(long, default_value = constants::DEFAULT_SCHEMA_PATH)]
        out: PathBuf,
        #[arg(long, value_enum, default_value = "full-url")]
        brand_scope: ScopeArg,
        #[arg(long, value_enum, default_value = "weighted")]
        tfidf_mode: TfidfArg,
    },

    /// Fit the TF-IDF vocabulary over a corpus' visible text
    FitVocabulary {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = constants::DEFAULT_VOCABULARY_PATH)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
        max_features: usize,
    },

    /// Derive suspicious URL/text keyword lists from phishing rows
    FitKeywords {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = constants::DEFAULT_KEYWORDS_DIR)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_KEYWORD_LIMIT)]
        limit: usize,
    },

    /// Extract feature records for a corpus into JSONL shards
    Extract {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// Fetch pages for rows without `raw_html`
        #[arg(long)]
        fetch: bool,
        #[arg(long, default_value_t = dataset::writer::MAX_SHARD_SIZE)]
        shard_size: u64,
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Merge shards (joined by URL) into one shard
    Merge {
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(required = true)]
        shards: Vec<PathBuf>,
    },

    /// Merge shards and write the training matrix as CSV
    ExportCsv {
        #[arg(long, env = "PHISHGUARD_SCHEMA", default_value = constants::DEFAULT_SCHEMA_PATH)]
        schema: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(required = true)]
        shards: Vec<PathBuf>,
    },

    /// Record which artifacts a freshly exported model was trained against
    WriteManifest {
        /// e.g. "random_forest"
        #[arg(long)]
        model_type: String,
        #[arg(long, env = "PHISHGUARD_MANIFEST", default_value = constants::DEFAULT_MANIFEST_PATH)]
        out: PathBuf,
        /// Class index of "benign" in the model's probability output
        #[arg(long, default_value_t = 1)]
        benign_class: usize,
        #[arg(long, default_value = "probabilities")]
        probability_output: String,
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Load every artifact and verify they belong together
    Check {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Score one URL
    Predict {
        url: String,
        #[command(flatten)]
        artifacts: ArtifactArgs,
        #[command(flatten)]
        model: ModelArgs,
    },
}

fn engine_config(artifacts: ArtifactArgs, model: ModelArgs) -> EngineConfig {
    EngineConfig {
        schema_path: artifacts.schema,
        trusted_domains_path: artifacts.trusted_domains,
        vocabulary_path: artifacts.vocabulary,
        keywords_dir: artifacts.keywords_dir.is_dir().then_some(artifacts.keywords_dir),
        model_path: model.model,
        manifest_path: model.manifest,
        fetch_timeout: Duration::from_secs(model.timeout),
        max_content_bytes: constants::DEFAULT_MAX_CONTENT_BYTES,
        fetch_enabled: !model.offline,
    }
}

fn artifacts_config(artifacts: ArtifactArgs) -> EngineConfig {
    EngineConfig {
        schema_path: artifacts.schema,
        trusted_domains_path: artifacts.trusted_domains,
        vocabulary_path: artifacts.vocabulary,
        keywords_dir: artifacts.keywords_dir.is_dir().then_some(artifacts.keywords_dir),
        ..EngineConfig::default()
    }
}

fn ensure_parent(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run(Cli::parse().command)
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::InitSchema { out, brand_scope, tfidf_mode } => {
            let options = ExtractionOptions {
                brand_scope: match brand_scope {
                    ScopeArg::FullUrl => BrandScope::FullUrl,
                    ScopeArg::PathOnly => BrandScope::PathOnly,
                },
                tfidf_mode: match tfidf_mode {
                    TfidfArg::Weighted => TfidfMode::Weighted,
                    TfidfArg::Binary => TfidfMode::Binary,
                },
            };
            let schema = FeatureSchema::from_names(FEATURE_VERSION, options, SELECTED_FEATURES)?;
            ensure_parent(&out)?;
            schema.save(&out)?;
            log::info!(
                "Wrote schema v{} ({} features, hash {:08x}) to {}",
                schema.version(),
                schema.len(),
                schema.layout_hash(),
                out.display()
            );
        }

        Command::FitVocabulary { corpus, out, max_features } => {
            let rows = dataset::read_corpus(&corpus)?;
            let texts = visible_texts(&rows);
            let vocabulary = LexicalVocabulary::fit(texts.iter().map(String::as_str), max_features);
            ensure_parent(&out)?;
            vocabulary.save(&out)?;
            log::info!("Wrote vocabulary {} to {}", vocabulary.checksum(), out.display());
        }

        Command::FitKeywords { corpus, out, limit } => {
            let rows = dataset::read_corpus(&corpus)?;
            let phishing: Vec<_> = rows.into_iter().filter(|r| r.label == 0).collect();
            if phishing.is_empty() {
                bail!("corpus {} has no phishing rows (label 0)", corpus.display());
            }
            let texts = visible_texts(&phishing);
            let lists = KeywordLists::fit(
                phishing.iter().map(|r| r.url.as_str()),
                texts.iter().map(String::as_str),
                limit,
            );
            lists.save(&out)?;
            log::info!(
                "Wrote keyword lists for {} phishing rows to {}",
                phishing.len(),
                out.display()
            );
        }

        Command::Extract { corpus, out_dir, fetch, shard_size, artifacts } => {
            let artifacts = Artifacts::load(&artifacts_config(artifacts))?;
            let pipeline = artifacts.pipeline()?;
            let rows = dataset::read_corpus(&corpus)?;

            let fetcher = HttpFetcher::new(
                constants::get_fetch_timeout(),
                constants::DEFAULT_MAX_CONTENT_BYTES,
            );
            let fetcher: Option<&dyn ContentFetcher> = if fetch {
                Some(&fetcher as &dyn ContentFetcher)
            } else {
                None
            };

            let records = dataset::extract_corpus(&pipeline, &rows, fetcher);
            let mut writer = DatasetWriter::new(&out_dir, "features", shard_size)?;
            for record in &records {
                writer.write(record)?;
            }
            for shard in writer.finish()? {
                println!("{}", shard.display());
            }
        }

        Command::Merge { out_dir, shards } => {
            let records = dataset::merge_shards(&shards)?;
            let mut writer = DatasetWriter::new(&out_dir, "merged", u64::MAX)?;
            for record in &records {
                writer.write(record)?;
            }
            for shard in writer.finish()? {
                println!("{}", shard.display());
            }
        }

        Command::ExportCsv { schema, out, shards } => {
            let schema = FeatureSchema::load(&schema)?;
            let records = dataset::merge_shards(&shards)?;
            ensure_parent(&out)?;
            dataset::export_csv(&schema, &records, &out)?;
        }

        Command::WriteManifest { model_type, out, benign_class, probability_output, artifacts } => {
            let artifacts = Artifacts::load(&artifacts_config(artifacts))?;
            let mut manifest = artifacts.manifest(model_type);
            manifest.benign_class_index = benign_class;
            manifest.probability_output = probability_output;
            ensure_parent(&out)?;
            manifest.save(&out)?;
            log::info!(
                "Wrote {} manifest (schema {:08x}, vocabulary {}, keywords {}) to {}",
                manifest.model_type,
                manifest.layout_hash,
                manifest.vocabulary_checksum,
                manifest.keywords_checksum,
                out.display()
            );
        }

        Command::Check { artifacts, model } => {
            let engine = PhishingEngine::load(&engine_config(artifacts, model))?;
            println!("{}", serde_json::to_string_pretty(&engine.schema().info())?);
            log::info!("All artifacts are compatible");
        }

        Command::Predict { url, artifacts, model } => {
            let engine = PhishingEngine::load(&engine_config(artifacts, model))?;
            let result = engine.predict(&url)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
