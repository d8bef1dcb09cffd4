//! Filter state endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use pffp_common::engine::{FilterDimension, FilterState};

use crate::{ApiResult, AppState};

/// Body of `PUT /api/filters/:dimension`
#[derive(Debug, Deserialize)]
pub struct SetFilterRequest {
    /// New value; empty or missing clears the dimension
    #[serde(default)]
    pub value: Option<String>,
}

/// GET /api/filters
pub async fn get_filters(State(state): State<AppState>) -> Json<FilterState> {
    Json(state.dashboard.filters().await)
}

/// PUT /api/filters/:dimension
///
/// Dimension names are the wire keys (`Year`, `project`, `Village_ID`,
/// `Farmer_ID`, `support`, `species`). Unknown names and unknown project
/// codes are rejected with 400.
pub async fn set_filter(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    Json(request): Json<SetFilterRequest>,
) -> ApiResult<Json<FilterState>> {
    let dimension: FilterDimension = dimension.parse()?;
    let value = request.value.unwrap_or_default();
    let filters = state.dashboard.set_filter(dimension, &value).await?;
    Ok(Json(filters))
}

/// POST /api/filters/reset
pub async fn reset_filters(State(state): State<AppState>) -> Json<FilterState> {
    Json(state.dashboard.reset_filters().await)
}

pub fn filter_routes() -> Router<AppState> {
    Router::new()
        .route("/api/filters", get(get_filters))
        .route("/api/filters/reset", post(reset_filters))
        .route("/api/filters/:dimension", put(set_filter))
}
