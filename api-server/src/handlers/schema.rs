//! Feature schema handler

use axum::{extract::State, Json};

use phishguard_core::logic::features::layout::LayoutInfo;

use crate::AppState;

/// Layout of the vectors this server builds
pub async fn get(State(state): State<AppState>) -> Json<LayoutInfo> {
    Json(state.engine.schema().info())
}
