//! Spreadsheet export of the filtered view
//!
//! A [`Workbook`] is assembled from the current view and handed to an
//! [`ExportSink`]. The bundled [`CsvBundleSink`] writes one CSV file per
//! sheet into a directory named after the workbook.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use pffp_common::engine::{extract_entities, EntityKey};
use pffp_common::{Error, Result};

use crate::store::CurrentView;
use crate::tables::{flat_rows, union_columns};

pub const REPORT_FILE_NAME: &str = "PFFP_Dashboard_Report.xlsx";

pub const SHEET_FARMERS: &str = "Farmers";
pub const SHEET_PLOTS: &str = "Plots";
pub const SHEET_YEARLY: &str = "Yearly Data";
pub const SHEET_SPECIES: &str = "Species";

/// Named sequence of flat field -> value rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Where a workbook ended up
#[derive(Debug, Clone, Serialize)]
pub struct ExportReceipt {
    pub file_name: String,
    pub location: PathBuf,
    pub sheets: usize,
    pub rows: usize,
}

/// Destination for exported workbooks
pub trait ExportSink: Send + Sync {
    fn write(&self, workbook: &Workbook) -> Result<ExportReceipt>;
}

/// Assemble the report workbook from the filtered view
///
/// Farmer, plot and yearly sheets carry every record field of the
/// entity-extracted rows; the species sheet is the full catalog.
pub fn build_workbook(view: &CurrentView) -> Workbook {
    let filtered = view.filtered();

    let entity_sheet = |name: &str, key: EntityKey| {
        let rows: Vec<_> = extract_entities(filtered.iter().copied(), key);
        Sheet {
            name: name.to_string(),
            rows: flat_rows(&rows),
        }
    };

    Workbook {
        file_name: REPORT_FILE_NAME.to_string(),
        sheets: vec![
            entity_sheet(SHEET_FARMERS, EntityKey::Farmer),
            entity_sheet(SHEET_PLOTS, EntityKey::Plot),
            entity_sheet(SHEET_YEARLY, EntityKey::Record),
            Sheet {
                name: SHEET_SPECIES.to_string(),
                rows: flat_rows(&view.snapshot.species),
            },
        ],
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn export_error(e: csv::Error) -> Error {
    Error::Export(e.to_string())
}

/// Writes `<out_dir>/<workbook stem>/<sheet>.csv`
pub struct CsvBundleSink {
    out_dir: PathBuf,
}

impl CsvBundleSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn sheet_path(dir: &Path, sheet: &Sheet) -> PathBuf {
        let safe_name = sheet.name.replace(['/', '\\'], "_").replace(' ', "_");
        dir.join(format!("{}.csv", safe_name))
    }

    fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
        let columns = union_columns(&sheet.rows);
        let mut writer = csv::Writer::from_path(path).map_err(export_error)?;

        writer.write_record(&columns).map_err(export_error)?;
        for row in &sheet.rows {
            let cells = columns.iter().map(|c| cell_text(row.get(c)));
            writer.write_record(cells).map_err(export_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ExportSink for CsvBundleSink {
    fn write(&self, workbook: &Workbook) -> Result<ExportReceipt> {
        let dir = self.out_dir.join(workbook.stem());
        fs::create_dir_all(&dir)?;

        for sheet in &workbook.sheets {
            let path = Self::sheet_path(&dir, sheet);
            Self::write_sheet(&path, sheet)?;
            tracing::debug!(sheet = %sheet.name, rows = sheet.rows.len(), "Wrote {}", path.display());
        }

        Ok(ExportReceipt {
            file_name: workbook.file_name.clone(),
            location: dir,
            sheets: workbook.sheets.len(),
            rows: workbook.sheets.iter().map(|s| s.rows.len()).sum(),
        })
    }
}
