//! Aggregation and filtering engine
//!
//! Pure, synchronous functions over borrowed record slices. Nothing here is
//! cached: callers recompute on every store refresh or filter change.
//!
//! Data flow:
//! - [`filter::apply_filters`] narrows the full record set to the filtered view
//! - [`kpi::compute_kpis`] reads the full set (plus the filtered view for one figure)
//! - [`charts::compute_charts`] reads the filtered view
//! - [`options::build_filter_options`] reads the full set so options never shrink

pub mod charts;
pub mod dedupe;
pub mod filter;
pub mod kpi;
pub mod options;

pub use charts::{compute_charts, ChartPoint, ChartSet};
pub use dedupe::{dedupe_by, extract_entities, EntityKey};
pub use filter::{apply_filters, FilterDimension, FilterState, Project, SpeciesMatch};
pub use kpi::{compute_kpis, Kpi};
pub use options::{build_filter_options, FilterOption, FilterOptions};
