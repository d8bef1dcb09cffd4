//! pffp-dashboard library - reporting service for the PFFP field program
//!
//! Holds the fetched program data and the filter state, runs the
//! aggregation engine from `pffp-common` over them, and serves the results
//! as JSON to the presentation layer.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod export;
pub mod pagination;
pub mod source;
pub mod store;
pub mod tables;

pub use crate::error::{ApiError, ApiResult};

use crate::export::ExportSink;
use crate::store::Dashboard;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store, filter state and display language
    pub dashboard: Arc<Dashboard>,
    /// Spreadsheet export destination; `None` when export is unavailable
    pub export_sink: Option<Arc<dyn ExportSink>>,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>, export_sink: Option<Arc<dyn ExportSink>>) -> Self {
        Self {
            dashboard,
            export_sink,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::dashboard_routes())
        .merge(api::filter_routes())
        .merge(api::language_routes())
        .merge(api::refresh_routes())
        .merge(api::table_routes())
        .merge(api::training_routes())
        .merge(api::export_routes())
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
