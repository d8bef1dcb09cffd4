//! HTTP API handlers for pffp-dashboard

pub mod buildinfo;
pub mod dashboard;
pub mod export;
pub mod filters;
pub mod health;
pub mod language;
pub mod refresh;
pub mod table;
pub mod training;

pub use buildinfo::get_build_info;
pub use dashboard::dashboard_routes;
pub use export::export_routes;
pub use filters::filter_routes;
pub use health::health_routes;
pub use language::language_routes;
pub use refresh::refresh_routes;
pub use table::table_routes;
pub use training::training_routes;
