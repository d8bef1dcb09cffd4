//! Six-slot filter state and the conjunctive filter pass

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{split_species_list, ProgramRecord};
use crate::{Error, Result};

/// Field program, identified by the `Farmer_ID` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Project {
    #[serde(rename = "SLOW")]
    Slow,
    #[serde(rename = "WWF")]
    Wwf,
}

impl Project {
    pub fn farmer_prefix(self) -> &'static str {
        match self {
            Project::Slow => "SL",
            Project::Wwf => "WF",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Project::Slow => "SLOW",
            Project::Wwf => "WWF",
        }
    }
}

impl FromStr for Project {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SLOW" => Ok(Project::Slow),
            "WWF" => Ok(Project::Wwf),
            other => Err(Error::InvalidInput(format!(
                "Unknown project '{}' (expected 'SLOW' or 'WWF')",
                other
            ))),
        }
    }
}

/// How the species filter compares against a row's species list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesMatch {
    /// Selected value must equal one trimmed token of the list
    #[default]
    Token,
    /// Selected value may appear anywhere in the raw list text
    Substring,
}

/// Filter slot names, as used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Year,
    Project,
    VillageId,
    FarmerId,
    Support,
    Species,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 6] = [
        FilterDimension::Year,
        FilterDimension::Project,
        FilterDimension::VillageId,
        FilterDimension::FarmerId,
        FilterDimension::Support,
        FilterDimension::Species,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterDimension::Year => "Year",
            FilterDimension::Project => "project",
            FilterDimension::VillageId => "Village_ID",
            FilterDimension::FarmerId => "Farmer_ID",
            FilterDimension::Support => "support",
            FilterDimension::Species => "species",
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterDimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FilterDimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown filter dimension: {}", s)))
    }
}

/// Current selection per filter dimension; `None` means unconstrained
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "project", default)]
    pub project: Option<Project>,
    #[serde(rename = "Village_ID", default)]
    pub village_id: Option<String>,
    #[serde(rename = "Farmer_ID", default)]
    pub farmer_id: Option<String>,
    #[serde(rename = "support", default)]
    pub support: Option<String>,
    #[serde(rename = "species", default)]
    pub species: Option<String>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }

    /// Set one slot; an empty value clears it
    pub fn set(&mut self, dimension: FilterDimension, value: &str) -> Result<()> {
        let selected = (!value.is_empty()).then(|| value.to_string());
        match dimension {
            FilterDimension::Year => self.year = selected,
            FilterDimension::Project => {
                self.project = selected.as_deref().map(str::parse::<Project>).transpose()?;
            }
            FilterDimension::VillageId => self.village_id = selected,
            FilterDimension::FarmerId => self.farmer_id = selected,
            FilterDimension::Support => self.support = selected,
            FilterDimension::Species => self.species = selected,
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    /// True when the record passes every set predicate
    pub fn matches(&self, record: &ProgramRecord, species_match: SpeciesMatch) -> bool {
        if let Some(project) = self.project {
            let prefixed = record
                .farmer_id()
                .map_or(false, |id| id.starts_with(project.farmer_prefix()));
            if !prefixed {
                return false;
            }
        }

        if let Some(year) = &self.year {
            if record.year_text().as_deref() != Some(year.as_str()) {
                return false;
            }
        }

        if !slot_matches(&self.village_id, record.village_id.as_deref()) {
            return false;
        }
        if !slot_matches(&self.farmer_id, record.farmer_id.as_deref()) {
            return false;
        }
        if !slot_matches(&self.support, record.support_program.as_deref()) {
            return false;
        }

        if let Some(species) = &self.species {
            let Some(raw) = record.species_names() else {
                return false;
            };
            let found = match species_match {
                SpeciesMatch::Substring => raw.contains(species.as_str()),
                SpeciesMatch::Token => split_species_list(raw).contains(&species.as_str()),
            };
            if !found {
                return false;
            }
        }

        true
    }
}

fn slot_matches(selected: &Option<String>, actual: Option<&str>) -> bool {
    match selected {
        Some(value) => actual == Some(value.as_str()),
        None => true,
    }
}

/// Filtered view: records passing all predicates, input order preserved
pub fn apply_filters<'a>(
    records: &'a [ProgramRecord],
    state: &FilterState,
    species_match: SpeciesMatch,
) -> Vec<&'a ProgramRecord> {
    if state.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| state.matches(r, species_match))
        .collect()
}
