//! # PFFP Common Library
//!
//! Shared code for the PFFP reporting dashboard:
//! - Program, species and administrative-unit record models
//! - Display-language field resolution
//! - The aggregation and filtering engine (dedup, filters, KPIs, charts,
//!   filter options)
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod engine;
pub mod error;
pub mod localize;
pub mod models;

pub use error::{Error, Result};
pub use localize::Language;
