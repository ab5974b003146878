//! PhishGuard API Server
//!
//! Serves phishing risk predictions for single URLs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    PHISHGUARD API                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐      ┌──────────────────────────────────┐ │
//! │  │  API      │      │  PhishingEngine (read-only)      │ │
//! │  │  Gateway  │ ───► │  fetch → extract → score         │ │
//! │  │  (Axum)   │      │  (spawn_blocking per request)    │ │
//! │  └───────────┘      └──────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod handlers;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishguard_core::PhishingEngine;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phishguard_server=debug,phishguard_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("PhishGuard API starting ({})...", config.environment);
    if !config.is_production() {
        tracing::debug!("Engine config: {:?}", config.engine);
    }

    // Artifacts are loaded once; any incompatibility stops the server here
    let engine = PhishingEngine::load(&config.engine)?;

    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PhishingEngine>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/api/v1/schema", get(handlers::schema::get))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use phishguard_core::logic::engine::Artifacts;
    use phishguard_core::logic::features::{
        ExtractionOptions, FeatureSchema, KeywordLists, LexicalVocabulary, TrustedDomainSet,
    };
    use phishguard_core::logic::fetch::OfflineFetcher;
    use phishguard_core::logic::model::{Classifier, InferenceError};

    /// Benign probability 0.2 for every URL
    struct MostlyPhishing;

    impl Classifier for MostlyPhishing {
        fn name(&self) -> &str {
            "mostly-phishing"
        }

        fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, InferenceError> {
            Ok(vec![0.8, 0.2])
        }
    }

    fn app() -> Router {
        let artifacts = Artifacts {
            schema: Arc::new(
                FeatureSchema::from_names(
                    1,
                    ExtractionOptions::default(),
                    &["url_length", "entropy"],
                )
                .unwrap(),
            ),
            trusted: Arc::new(TrustedDomainSet::empty()),
            vocabulary: Arc::new(LexicalVocabulary::empty()),
            keywords: Arc::new(KeywordLists::default()),
        };
        let manifest = artifacts.manifest("test");
        let engine = PhishingEngine::from_parts(
            artifacts,
            &manifest,
            Arc::new(MostlyPhishing),
            Box::new(OfflineFetcher),
        )
        .unwrap();

        create_router(AppState { engine: Arc::new(engine) })
    }

    async fn post_json(body: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::post("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_predict() {
        let (status, body) = post_json(r#"{"url": " http://paypal-login.verify.ru/ "}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "http://paypal-login.verify.ru");
        assert_eq!(body["probability_phishing"], 0.8);
        assert_eq!(body["risk"], "High");
    }

    #[tokio::test]
    async fn test_missing_or_empty_url_is_400() {
        for payload in [r#"{}"#, r#"{"url": ""}"#, r#"{"url": "  / "}"#] {
            let (status, body) = post_json(payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["status"], 400);
            assert_eq!(body["error"], "Missing 'url' parameter");
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (status, body) = post_json("not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_health_and_schema() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(Request::get("/api/v1/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["feature_count"], 2);
        assert_eq!(body["feature_names"][1], "entropy");
    }
}
