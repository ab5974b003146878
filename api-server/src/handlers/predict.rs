//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use phishguard_core::PredictionResult;

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Score one URL. Missing or blank `url` is a 400.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResult>> {
    let Json(req) = body.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let url = req.url.unwrap_or_default();

    // Extraction blocks on the page fetch
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.predict(&url)).await??;

    Ok(Json(result))
}
