//! Farmer training history

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use pffp_common::localize::{resolve_localized, LocalizedField};
use pffp_common::models::TrainingRecord;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct TrainingResponse {
    pub farmer_id: String,
    /// Name in the display language, if known
    pub full_name: Option<String>,
    /// Sessions in their recorded order; empty when none were recorded
    pub training: Vec<TrainingRecord>,
}

/// GET /api/farmers/:farmer_id/training
///
/// Looks the farmer up in the filtered view; the first matching row wins.
pub async fn get_training(
    State(state): State<AppState>,
    Path(farmer_id): Path<String>,
) -> ApiResult<Json<TrainingResponse>> {
    let current = state.dashboard.current().await;
    let filtered = current.filtered();

    let farmer = filtered
        .iter()
        .find(|r| r.farmer_id() == Some(farmer_id.as_str()))
        .ok_or_else(|| ApiError::NotFound(format!("Farmer {}", farmer_id)))?;

    Ok(Json(TrainingResponse {
        full_name: resolve_localized(farmer, LocalizedField::FullName, current.language)
            .map(str::to_string),
        training: farmer.training().to_vec(),
        farmer_id,
    }))
}

pub fn training_routes() -> Router<AppState> {
    Router::new().route("/api/farmers/:farmer_id/training", get(get_training))
}
