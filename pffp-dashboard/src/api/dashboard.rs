//! Dashboard read endpoints
//!
//! Every response is recomputed from the current snapshot, filters and
//! display language.

use axum::{extract::State, routing::get, Json, Router};

use pffp_common::engine::{build_filter_options, compute_charts, compute_kpis, ChartSet, FilterOptions, Kpi};

use crate::store::DashboardView;
use crate::AppState;

/// GET /api/dashboard
///
/// KPIs, charts, filter options and the state they were computed from.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.view().await)
}

/// GET /api/kpis
pub async fn get_kpis(State(state): State<AppState>) -> Json<Kpi> {
    let current = state.dashboard.current().await;
    let filtered = current.filtered();
    Json(compute_kpis(&current.snapshot.records, &filtered))
}

/// GET /api/charts
pub async fn get_charts(State(state): State<AppState>) -> Json<ChartSet> {
    let current = state.dashboard.current().await;
    let filtered = current.filtered();
    Json(compute_charts(&filtered, current.language))
}

/// GET /api/filter-options
///
/// Built from the unfiltered records so the lists never shrink.
pub async fn get_filter_options(State(state): State<AppState>) -> Json<FilterOptions> {
    let current = state.dashboard.current().await;
    let snapshot = &current.snapshot;
    Json(build_filter_options(&snapshot.records, &snapshot.admin, current.language))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/kpis", get(get_kpis))
        .route("/api/charts", get(get_charts))
        .route("/api/filter-options", get(get_filter_options))
}
