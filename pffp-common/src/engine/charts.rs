//! Chart-ready projections of the filtered view
//!
//! Each chart is a sequence of (label, value) points in order of first
//! appearance. Labels are resolved in the active display language.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::dedupe::{extract_entities, EntityKey};
use crate::localize::{display_localized, resolve_localized, Language, LocalizedField};
use crate::models::{split_species_list, ProgramRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// The three dashboard charts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub ethnicity: Vec<ChartPoint>,
    pub area_by_village: Vec<ChartPoint>,
    pub trees_by_species: Vec<ChartPoint>,
}

/// Insertion-ordered running totals
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    points: Vec<ChartPoint>,
}

impl Tally {
    fn add(&mut self, label: &str, amount: f64) {
        match self.index.get(label) {
            Some(&i) => self.points[i].value += amount,
            None => {
                self.index.insert(label.to_string(), self.points.len());
                self.points.push(ChartPoint {
                    name: label.to_string(),
                    value: amount,
                });
            }
        }
    }

    fn finish(self, round: impl Fn(f64) -> f64) -> Vec<ChartPoint> {
        self.points
            .into_iter()
            .map(|p| ChartPoint {
                value: round(p.value),
                ..p
            })
            .collect()
    }
}

/// Round half away from zero to two decimals
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Farmer count per resolved ethnicity label ("N/A" when unknown)
pub fn ethnicity_distribution(filtered: &[&ProgramRecord], language: Language) -> Vec<ChartPoint> {
    let mut tally = Tally::default();
    for farmer in extract_entities(filtered.iter().copied(), EntityKey::Farmer) {
        tally.add(display_localized(farmer, LocalizedField::Ethnicity, language), 1.0);
    }
    tally.finish(|v| v)
}

/// Plot area per resolved village name, rounded to two decimals
///
/// Plots whose village name cannot be resolved are left out.
pub fn area_by_village(filtered: &[&ProgramRecord], language: Language) -> Vec<ChartPoint> {
    let mut tally = Tally::default();
    for plot in extract_entities(filtered.iter().copied(), EntityKey::Plot) {
        if let Some(village) = resolve_localized(plot, LocalizedField::VillageName, language) {
            tally.add(village, plot.area_ha());
        }
    }
    tally.finish(round2)
}

/// Trees planted per species across yearly rows
///
/// A row's count is split evenly across its species list. Shares accumulate
/// at full precision and are rounded only once per species at the end.
pub fn trees_by_species(filtered: &[&ProgramRecord]) -> Vec<ChartPoint> {
    let mut tally = Tally::default();
    for row in filtered.iter().filter(|r| r.record_id().is_some()) {
        let planted = row.trees_planted();
        let Some(raw) = row.species_names() else {
            continue;
        };
        if planted <= 0.0 {
            continue;
        }

        let species = split_species_list(raw);
        let share = planted / species.len().max(1) as f64;
        for name in species {
            tally.add(name, share);
        }
    }
    tally.finish(f64::round)
}

pub fn compute_charts(filtered: &[&ProgramRecord], language: Language) -> ChartSet {
    ChartSet {
        ethnicity: ethnicity_distribution(filtered, language),
        area_by_village: area_by_village(filtered, language),
        trees_by_species: trees_by_species(filtered),
    }
}
