//! Program-wide summary counters
//!
//! All figures except `total_villages` are scoped to farmers with active
//! status in the full store and ignore the filter state.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};

use crate::engine::charts::round2;
use crate::engine::dedupe::{extract_entities, EntityKey};
use crate::models::{split_species_list, ProgramRecord};

/// Summary statistics shown on the KPI cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub total_farmers: usize,
    pub total_plots: usize,
    /// Hectares, formatted to two decimals
    pub total_area: String,
    #[serde(serialize_with = "whole_number")]
    pub total_planted_trees: f64,
    pub total_species: usize,
    pub total_villages: usize,
    pub total_soil_tests: usize,
}

/// Integral counts go out as JSON integers (`42`, not `42.0`)
fn whole_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Sum starting from +0.0; `Iterator::sum` of an empty float iterator is -0.0
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| acc + v)
}

/// Compute KPIs from the full store and the current filtered view
pub fn compute_kpis(all: &[ProgramRecord], filtered: &[&ProgramRecord]) -> Kpi {
    let active_farmers: HashSet<&str> = all
        .iter()
        .filter(|r| r.is_active())
        .filter_map(ProgramRecord::farmer_id)
        .collect();

    let is_active_farmer =
        |r: &&ProgramRecord| r.farmer_id().map_or(false, |id| active_farmers.contains(id));

    let active_plots = extract_entities(all.iter().filter(is_active_farmer), EntityKey::Plot);
    let total_area = total(active_plots.iter().map(|p| p.area_ha()));

    // Yearly rows are not deduplicated: every record of an active farmer counts
    let active_yearly: Vec<&ProgramRecord> = all
        .iter()
        .filter(|r| r.record_id().is_some())
        .filter(is_active_farmer)
        .collect();
    let total_planted_trees = total(active_yearly.iter().map(|r| r.trees_planted()));

    let species: BTreeSet<&str> = active_yearly
        .iter()
        .filter_map(|r| r.species_names_or_legacy())
        .flat_map(split_species_list)
        .collect();

    let total_soil_tests = all
        .iter()
        .filter(|r| r.is_active() && r.activity_done())
        .count();

    let villages: HashSet<&str> = filtered.iter().filter_map(|r| r.village_name()).collect();

    Kpi {
        total_farmers: active_farmers.len(),
        total_plots: active_plots.len(),
        // Ties round up, matching the area chart
        total_area: format!("{:.2}", round2(total_area)),
        total_planted_trees,
        total_species: species.len(),
        total_villages: villages.len(),
        total_soil_tests,
    }
}
