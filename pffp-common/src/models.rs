//! Record models for the program data feed
//!
//! The feed delivers one wide, denormalized row per farmer/plot/year
//! combination. A single row may describe a farmer, a plot and a yearly
//! activity at once; entity sets are recovered by grouping on the
//! entity-specific key (see [`crate::engine::dedupe`]).
//!
//! Every field is optional and every accessor has a defined fallback, so a
//! malformed row degrades into the aggregates instead of failing the load.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Membership status of a currently enrolled farmer
pub const ACTIVE_STATUS: &str = "Act";

/// Identifier prefix of village-level administrative units
pub const VILLAGE_PREFIX: &str = "VIL";

/// Value that may arrive as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(Number),
    Text(String),
    Bool(bool),
}

impl Scalar {
    /// Lenient numeric coercion: numbers as-is, trimmed numeric text parsed,
    /// booleans as 1/0, everything else 0
    pub fn as_number(&self) -> f64 {
        let n = match self {
            Scalar::Number(n) => n.as_f64().unwrap_or(0.0),
            Scalar::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse::<f64>().unwrap_or(0.0)
                }
            }
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        };

        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    /// Text form used for exact-match comparisons (`2023` and `"2023"` agree)
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Number(n) => number_text(n),
            Scalar::Text(s) => s.clone(),
            Scalar::Bool(b) => b.to_string(),
        }
    }

    /// True for values that carry no information: `""`, `0`, `false`
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(n) => n.as_f64().map_or(true, |v| v == 0.0),
            Scalar::Text(s) => s.is_empty(),
            Scalar::Bool(b) => !b,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Scalar::Number(n)),
            Value::String(s) => Some(Scalar::Text(s)),
            Value::Bool(b) => Some(Scalar::Bool(b)),
            _ => None,
        }
    }
}

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Numeric value of an optional scalar, 0 when absent or non-numeric
pub fn number_or_zero(value: Option<&Scalar>) -> f64 {
    value.map_or(0.0, Scalar::as_number)
}

/// Split a species list on `,` or `;`, trimming and dropping empty tokens
pub fn split_species_list(raw: &str) -> Vec<&str> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(number_text(&n)),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_scalar<'de, D>(deserializer: D) -> Result<Option<Scalar>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(Scalar::from_value))
}

fn lenient_training<'de, D>(deserializer: D) -> Result<Option<Vec<TrainingRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// One entry of a farmer's training history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(rename = "Training_Year", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub year: Option<Scalar>,
    #[serde(rename = "Training_Topic", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "Who organize", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
}

/// Wide program row: farmer demographics, plot and yearly activity fields
///
/// Unknown fields are kept in `extra` so exports carry every column. Exported
/// columns follow the declared field order with the unknown fields last, not
/// the key order of the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(rename = "Farmer_ID", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub farmer_id: Option<String>,
    #[serde(rename = "Full_Name", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "Full_Name_VI", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub full_name_vi: Option<String>,
    #[serde(rename = "Full_Name_EN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub full_name_en: Option<String>,
    #[serde(rename = "Gender", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "Gender_VI", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub gender_vi: Option<String>,
    #[serde(rename = "Gender_EN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub gender_en: Option<String>,
    #[serde(rename = "Ethnicity", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(rename = "Ethnicity_VI", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ethnicity_vi: Option<String>,
    #[serde(rename = "Ethnicity_EN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ethnicity_en: Option<String>,
    #[serde(rename = "Village_ID", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub village_id: Option<String>,
    #[serde(rename = "Village_Name", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub village_name: Option<String>,
    #[serde(rename = "Village_Name_VI", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub village_name_vi: Option<String>,
    #[serde(rename = "Village_Name_EN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub village_name_en: Option<String>,
    #[serde(rename = "Plot_Id", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub plot_id: Option<String>,
    #[serde(rename = "Plot_Name", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub plot_name: Option<String>,
    #[serde(rename = "Area (ha)", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub area_ha: Option<Scalar>,
    #[serde(rename = "Year", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub year: Option<Scalar>,
    #[serde(rename = "Record_Id", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(rename = "Farm registered for support from", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub support_program: Option<String>,
    #[serde(rename = "Shade_Trees_Species_Names", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub species_names: Option<String>,
    /// Legacy species column, consulted only when `species_names` is empty
    #[serde(rename = "Shade_Trees_Species", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub species_legacy: Option<String>,
    #[serde(rename = "Number_Shade_Trees_Planted", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub trees_planted: Option<Scalar>,
    #[serde(rename = "Shade_Trees_Died", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub trees_died: Option<Scalar>,
    #[serde(rename = "Soil_Test_Support", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub soil_test_support: Option<String>,
    #[serde(rename = "Annual_Volume_Cherry", default, deserialize_with = "lenient_scalar", skip_serializing_if = "Option::is_none")]
    pub annual_volume_cherry: Option<Scalar>,
    #[serde(rename = "TrainingHistory", default, deserialize_with = "lenient_training", skip_serializing_if = "Option::is_none")]
    pub training_history: Option<Vec<TrainingRecord>>,
    #[serde(rename = "Status", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Activity", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgramRecord {
    pub fn farmer_id(&self) -> Option<&str> {
        non_empty(&self.farmer_id)
    }

    pub fn plot_id(&self) -> Option<&str> {
        non_empty(&self.plot_id)
    }

    pub fn record_id(&self) -> Option<&str> {
        non_empty(&self.record_id)
    }

    pub fn village_id(&self) -> Option<&str> {
        non_empty(&self.village_id)
    }

    /// Unsuffixed village name, the key used for village counting
    pub fn village_name(&self) -> Option<&str> {
        non_empty(&self.village_name)
    }

    pub fn support_program(&self) -> Option<&str> {
        non_empty(&self.support_program)
    }

    pub fn species_names(&self) -> Option<&str> {
        non_empty(&self.species_names)
    }

    /// Species list, falling back to the legacy column
    pub fn species_names_or_legacy(&self) -> Option<&str> {
        self.species_names().or_else(|| non_empty(&self.species_legacy))
    }

    /// Year as text, `None` when absent
    pub fn year_text(&self) -> Option<String> {
        self.year.as_ref().map(Scalar::to_text)
    }

    pub fn area_ha(&self) -> f64 {
        number_or_zero(self.area_ha.as_ref())
    }

    pub fn trees_planted(&self) -> f64 {
        number_or_zero(self.trees_planted.as_ref())
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(ACTIVE_STATUS)
    }

    /// Activity marker reads "done" (trimmed, case-insensitive)
    pub fn activity_done(&self) -> bool {
        self.activity
            .as_deref()
            .map_or(false, |a| a.trim().to_lowercase() == "done")
    }

    pub fn training(&self) -> &[TrainingRecord] {
        self.training_history.as_deref().unwrap_or_default()
    }
}

/// Species catalog entry, displayed as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    #[serde(rename = "Species_ID", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub species_id: Option<String>,
    #[serde(rename = "Species_name", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Species type", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub species_type: Option<String>,
    #[serde(rename = "Species_images", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Administrative unit (province, commune, village...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUnit {
    #[serde(rename = "Adm_ID", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub adm_id: Option<String>,
    #[serde(rename = "Label VN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub label_vn: Option<String>,
    #[serde(rename = "Label EN", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub label_en: Option<String>,
}

impl AdminUnit {
    pub fn is_village(&self) -> bool {
        self.adm_id
            .as_deref()
            .map_or(false, |id| id.starts_with(VILLAGE_PREFIX))
    }
}
