//! Display-language selection of localized record fields
//!
//! Demographic fields come in three spellings: `Field_VI`, `Field_EN` and the
//! unsuffixed `Field`. The suffixed variant for the active language wins,
//! then the unsuffixed field, then the literal [`NOT_AVAILABLE`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{AdminUnit, ProgramRecord};
use crate::Error;

/// Placeholder shown when no spelling of a field is present
pub const NOT_AVAILABLE: &str = "N/A";

/// Two-valued display language toggle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Vi => Language::En,
            Language::En => Language::Vi,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Vi => "vi",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vi" => Ok(Language::Vi),
            "en" => Ok(Language::En),
            other => Err(Error::InvalidInput(format!(
                "Unknown language '{}' (expected 'vi' or 'en')",
                other
            ))),
        }
    }
}

/// Record fields that carry language variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizedField {
    FullName,
    Gender,
    Ethnicity,
    VillageName,
}

impl LocalizedField {
    /// Unsuffixed wire name, also the table column header
    pub fn base_name(self) -> &'static str {
        match self {
            LocalizedField::FullName => "Full_Name",
            LocalizedField::Gender => "Gender",
            LocalizedField::Ethnicity => "Ethnicity",
            LocalizedField::VillageName => "Village_Name",
        }
    }

    fn variants(self, record: &ProgramRecord) -> [&Option<String>; 3] {
        match self {
            LocalizedField::FullName => [&record.full_name_vi, &record.full_name_en, &record.full_name],
            LocalizedField::Gender => [&record.gender_vi, &record.gender_en, &record.gender],
            LocalizedField::Ethnicity => [&record.ethnicity_vi, &record.ethnicity_en, &record.ethnicity],
            LocalizedField::VillageName => {
                [&record.village_name_vi, &record.village_name_en, &record.village_name]
            }
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Resolve a localized field: language variant, then base field
///
/// Empty strings count as absent. Returns `None` when neither is present.
pub fn resolve_localized(
    record: &ProgramRecord,
    field: LocalizedField,
    language: Language,
) -> Option<&str> {
    let [vi, en, base] = field.variants(record);
    let suffixed = match language {
        Language::Vi => vi,
        Language::En => en,
    };
    present(suffixed).or_else(|| present(base))
}

/// Like [`resolve_localized`] but falls back to [`NOT_AVAILABLE`]
pub fn display_localized(record: &ProgramRecord, field: LocalizedField, language: Language) -> &str {
    resolve_localized(record, field, language).unwrap_or(NOT_AVAILABLE)
}

/// Label of an administrative unit in the active language
pub fn admin_label(unit: &AdminUnit, language: Language) -> Option<&str> {
    match language {
        Language::Vi => present(&unit.label_vn),
        Language::En => present(&unit.label_en),
    }
}
