#![cfg(feature = "excel")]

//! Spreadsheet (`.xlsx`) decoder.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::types::{normalize_column_names, Cell, Table, Value};

use super::source;

/// Which worksheet to read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelector {
    /// First sheet in workbook order.
    #[default]
    First,
    /// Sheet by 0-based position.
    Index(usize),
    /// Sheet by exact name.
    Name(String),
}

impl SheetSelector {
    /// Parse a CLI-style selector: all digits -> 0-based index, anything else -> sheet name.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(idx) = raw.parse::<usize>() {
                return SheetSelector::Index(idx);
            }
        }
        SheetSelector::Name(raw.to_string())
    }
}

/// Options for [`read_excel_from_path`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExcelOptions {
    pub sheet: SheetSelector,
    /// Number of sheet rows (counted from row 1) to skip before the header row.
    pub header_row: usize,
    pub limit: Option<usize>,
}

impl ExcelOptions {
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read one worksheet of an Excel workbook into a [`Table`].
///
/// Behavior:
/// - rows are counted from the top of the sheet (row 1), not from the first used cell
/// - the first `header_row` rows are skipped; the next row is the header, coerced to strings
/// - every following row is a data row, empty cells and empty strings become `None`
pub fn read_excel_from_path(path: impl AsRef<Path>, options: &ExcelOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    source::require_uncompressed(path, "xlsx")?;
    debug!(path = %path.display(), sheet = ?options.sheet, header_row = options.header_row, "reading workbook");

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    let sheet = match &options.sheet {
        SheetSelector::First => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| InspectError::file_format("workbook has no sheets"))?,
        SheetSelector::Index(idx) => sheet_names.get(*idx).cloned().ok_or_else(|| {
            InspectError::file_format(format!(
                "no sheet at index {idx} (workbook has {} sheets)",
                sheet_names.len()
            ))
        })?,
        SheetSelector::Name(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(InspectError::file_format(format!("no such sheet: {name}")));
            }
            name.clone()
        }
    };

    let range = workbook.worksheet_range(&sheet)?;
    table_from_range(&sheet, &range, options)
}

fn table_from_range(sheet: &str, range: &Range<Data>, options: &ExcelOptions) -> InspectResult<Table> {
    // `Range` only spans used cells; address absolutely so leading blank rows/columns still count.
    let (height, width) = match range.end() {
        Some((row, col)) => (row as usize + 1, col as usize + 1),
        None => (0, 0),
    };

    if options.header_row >= height {
        return Err(InspectError::file_format(format!(
            "sheet '{sheet}' has no header row (header_row={}, rows={height})",
            options.header_row
        )));
    }
    let columns = normalize_column_names(
        (0..width).map(|c| cell_to_header_string(cell_at(range, options.header_row, c))),
    );

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for r in options.header_row + 1..height {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        rows.push((0..width).map(|c| convert_cell(cell_at(range, r, c))).collect());
    }

    debug!(sheet, rows = rows.len(), columns = columns.len(), "worksheet decoded");
    Table::new(columns, rows)
}

fn cell_at(range: &Range<Data>, row: usize, col: usize) -> &Data {
    range
        .get_value((row as u32, col as u32))
        .unwrap_or(&Data::Empty)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

// 2^53: larger floats are not guaranteed to be exact integers.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn convert_cell(c: &Data) -> Cell {
    match c {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::Utf8(s.clone())),
        Data::Int(i) => Some(Value::Int64(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => Some(Value::Int64(*f as i64)),
        Data::Float(f) => Some(Value::Float64(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Utf8(s.clone())),
        other => Some(Value::Utf8(other.to_string())),
    }
}
