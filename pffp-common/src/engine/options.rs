//! Selectable values per filter dimension
//!
//! Built from the unfiltered store so the option lists never shrink while
//! filters are applied.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::engine::dedupe::{dedupe_by, extract_entities, EntityKey};
use crate::localize::{admin_label, resolve_localized, Language, LocalizedField};
use crate::models::{split_species_list, AdminUnit, ProgramRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    fn same(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: value.to_string(),
        }
    }
}

/// Option lists keyed by filter dimension (the project list is fixed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(rename = "Year")]
    pub year: Vec<FilterOption>,
    #[serde(rename = "Village_ID")]
    pub village_id: Vec<FilterOption>,
    #[serde(rename = "Farmer_ID")]
    pub farmer_id: Vec<FilterOption>,
    #[serde(rename = "support")]
    pub support: Vec<FilterOption>,
    #[serde(rename = "species")]
    pub species: Vec<FilterOption>,
}

/// Newest year first; numeric years compare by value, other text after them
fn compare_years_desc(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x).then_with(|| b.cmp(a)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

pub fn year_options(all: &[ProgramRecord]) -> Vec<FilterOption> {
    let years = all
        .iter()
        .filter_map(|r| r.year.as_ref())
        .filter(|y| !y.is_blank())
        .map(|y| y.to_text());
    let mut years = dedupe_by(years, |y| y.clone());
    years.sort_by(|a, b| compare_years_desc(a, b));
    years.iter().map(|y| FilterOption::same(y)).collect()
}

pub fn village_options(admin: &[AdminUnit], language: Language) -> Vec<FilterOption> {
    admin
        .iter()
        .filter(|u| u.is_village())
        .filter_map(|u| {
            let id = u.adm_id.as_deref()?;
            Some(FilterOption {
                value: id.to_string(),
                label: admin_label(u, language).unwrap_or(id).to_string(),
            })
        })
        .collect()
}

/// One option per farmer, labelled "Full Name (ID)" or just the ID when
/// no name is known
pub fn farmer_options(all: &[ProgramRecord], language: Language) -> Vec<FilterOption> {
    extract_entities(all, EntityKey::Farmer)
        .into_iter()
        .filter_map(|r| {
            let id = r.farmer_id()?;
            let label = match resolve_localized(r, LocalizedField::FullName, language) {
                Some(name) => format!("{} ({})", name, id),
                None => id.to_string(),
            };
            Some(FilterOption {
                value: id.to_string(),
                label,
            })
        })
        .collect()
}

pub fn support_options(all: &[ProgramRecord]) -> Vec<FilterOption> {
    let programs = all.iter().filter_map(ProgramRecord::support_program);
    dedupe_by(programs, |p| *p)
        .into_iter()
        .map(FilterOption::same)
        .collect()
}

/// Every species token in the store, sorted ascending
pub fn species_options(all: &[ProgramRecord]) -> Vec<FilterOption> {
    let species: BTreeSet<&str> = all
        .iter()
        .filter_map(ProgramRecord::species_names)
        .flat_map(split_species_list)
        .collect();
    species.into_iter().map(FilterOption::same).collect()
}

pub fn build_filter_options(
    all: &[ProgramRecord],
    admin: &[AdminUnit],
    language: Language,
) -> FilterOptions {
    FilterOptions {
        year: year_options(all),
        village_id: village_options(admin, language),
        farmer_id: farmer_options(all, language),
        support: support_options(all),
        species: species_options(all),
    }
}
