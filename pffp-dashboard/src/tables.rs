//! Tabular projections of the filtered view
//!
//! Farmers, plots and yearly rows are entity-extracted from the filtered
//! records; the species table is the catalog as fetched.

use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

use pffp_common::engine::{extract_entities, EntityKey};
use pffp_common::localize::{resolve_localized, LocalizedField};
use pffp_common::models::{ProgramRecord, Scalar};
use pffp_common::{Error, Language};

use crate::store::CurrentView;

/// The four table cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Farmers,
    Plots,
    Yearly,
    Species,
}

impl TableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Farmers => "farmers",
            TableKind::Plots => "plots",
            TableKind::Yearly => "yearly",
            TableKind::Species => "species",
        }
    }
}

impl FromStr for TableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmers" => Ok(TableKind::Farmers),
            "plots" => Ok(TableKind::Plots),
            "yearly" => Ok(TableKind::Yearly),
            "species" => Ok(TableKind::Species),
            other => Err(Error::NotFound(format!("Unknown table: {}", other))),
        }
    }
}

/// Column names plus row values in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

const FARMER_FIELDS: [LocalizedField; 4] = [
    LocalizedField::FullName,
    LocalizedField::Gender,
    LocalizedField::Ethnicity,
    LocalizedField::VillageName,
];
const PLOT_COLUMNS: &[&str] = &["Plot_Id", "Plot_Name", "Farmer_ID", "Area (ha)"];
const YEARLY_COLUMNS: &[&str] = &[
    "Farmer_ID",
    "Year",
    "Annual_Volume_Cherry",
    "Number_Shade_Trees_Planted",
    "Shade_Trees_Species_Names",
    "Shade_Trees_Died",
    "Soil_Test_Support",
];

fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

fn scalar(value: Option<&Scalar>) -> Value {
    match value {
        Some(Scalar::Number(n)) => Value::Number(n.clone()),
        Some(Scalar::Text(s)) => Value::String(s.clone()),
        Some(Scalar::Bool(b)) => Value::Bool(*b),
        None => Value::Null,
    }
}

/// Localized cell; missing values render as an empty string
fn localized(record: &ProgramRecord, field: LocalizedField, language: Language) -> Value {
    Value::String(resolve_localized(record, field, language).unwrap_or("").to_string())
}

fn farmers_table(filtered: &[&ProgramRecord], language: Language) -> Table {
    let mut columns = vec!["Farmer_ID"];
    columns.extend(FARMER_FIELDS.iter().map(|f| f.base_name()));
    let mut table = Table::with_columns(&columns);

    for farmer in extract_entities(filtered.iter().copied(), EntityKey::Farmer) {
        let mut row = vec![text(farmer.farmer_id())];
        row.extend(FARMER_FIELDS.iter().map(|&f| localized(farmer, f, language)));
        table.rows.push(row);
    }
    table
}

fn plots_table(filtered: &[&ProgramRecord]) -> Table {
    let mut table = Table::with_columns(PLOT_COLUMNS);
    for plot in extract_entities(filtered.iter().copied(), EntityKey::Plot) {
        table.rows.push(vec![
            text(plot.plot_id()),
            text(plot.plot_name.as_deref()),
            text(plot.farmer_id()),
            scalar(plot.area_ha.as_ref()),
        ]);
    }
    table
}

fn yearly_table(filtered: &[&ProgramRecord]) -> Table {
    let mut table = Table::with_columns(YEARLY_COLUMNS);
    for row in extract_entities(filtered.iter().copied(), EntityKey::Record) {
        table.rows.push(vec![
            text(row.farmer_id()),
            scalar(row.year.as_ref()),
            scalar(row.annual_volume_cherry.as_ref()),
            scalar(row.trees_planted.as_ref()),
            text(row.species_names.as_deref()),
            scalar(row.trees_died.as_ref()),
            text(row.soil_test_support.as_deref()),
        ]);
    }
    table
}

/// Serialize items to flat objects
///
/// Nested arrays and objects become their JSON text.
pub fn flat_rows<T: Serialize>(items: &[T]) -> Vec<Map<String, Value>> {
    items
        .iter()
        .filter_map(|item| match serde_json::to_value(item) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Skipping row that failed to serialize: {}", e);
                None
            }
        })
        .map(|map| {
            map.into_iter()
                .map(|(key, value)| match value {
                    Value::Array(_) | Value::Object(_) => (key, Value::String(value.to_string())),
                    scalar => (key, scalar),
                })
                .collect()
        })
        .collect()
}

/// Union of row keys in first-seen order
pub fn union_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn species_table(view: &CurrentView) -> Table {
    let rows = flat_rows(&view.snapshot.species);
    let columns = union_columns(&rows);
    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    Table { columns, rows }
}

pub fn build_table(kind: TableKind, view: &CurrentView) -> Table {
    let filtered = view.filtered();
    match kind {
        TableKind::Farmers => farmers_table(&filtered, view.language),
        TableKind::Plots => plots_table(&filtered),
        TableKind::Yearly => yearly_table(&filtered),
        TableKind::Species => species_table(view),
    }
}
