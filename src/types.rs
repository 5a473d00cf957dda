//! Core data model: the normalized [`Table`] every decoder produces.
//!
//! A table is rectangular (every row has one cell per column), has unique non-empty column
//! names, and represents missing values as `None` cells regardless of the source format.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::{InspectError, InspectResult};

/// A single non-null value in a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Raw bytes (SQLite BLOBs, Parquet binary columns).
    Bytes(Vec<u8>),
}

/// A table cell: `None` is the one null representation shared by all formats.
pub type Cell = Option<Value>;

/// Row-mapping view of a table row (column name -> cell).
pub type Record = BTreeMap<String, Cell>;

impl Value {
    /// Numeric view of the value, if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// `true` for [`Value::Int64`] and [`Value::Float64`].
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    /// Short type name used in messages and validation rules.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int64(_) => "integer",
            Value::Float64(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Utf8(_) => "string",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Hashable identity of a [`Value`] for counting and de-duplication.
///
/// Numbers compare by numeric value (`Int64(1)` == `Float64(1.0)`, `0.0` == `-0.0`); other
/// variants compare within their own type only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ValueKey {
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl ValueKey {
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Int64(v) => ValueKey::Int(*v),
            Value::Float64(f) => float_key(*f),
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Utf8(s) => ValueKey::Text(s.clone()),
            Value::Bytes(b) => ValueKey::Bytes(b.clone()),
        }
    }
}

fn float_key(f: f64) -> ValueKey {
    // Integral floats inside the i64 range share a key with the equal integer.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return ValueKey::Int(f as i64);
    }
    if f.is_nan() {
        return ValueKey::Float(f64::NAN.to_bits());
    }
    ValueKey::Float(f.to_bits())
}

/// Normalized in-memory table.
///
/// Construct with [`Table::new`]; the table is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table, enforcing rectangularity and unique, non-empty column names.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> InspectResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if name.is_empty() {
                return Err(InspectError::file_format("column names must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(InspectError::file_format(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(InspectError::file_format(format!(
                "row {idx} has {} cells but the table has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// A table with the given columns and no rows.
    pub fn empty(columns: Vec<String>) -> InspectResult<Self> {
        Self::new(columns, Vec::new())
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major cell storage, in column order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Returns the index of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` for column `column`; `None` if either does not exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Iterate the cells of one column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Row-mapping view: one [`Record`] per row holding every column (nulls included).
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Consume the table into its parts.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}

/// Turn raw header cells into usable column names.
///
/// - surrounding whitespace is trimmed
/// - empty names become `column_<n>` (1-based position)
/// - repeated names get `_2`, `_3`, ... appended, skipping suffixes that are already taken
pub fn normalize_column_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let trimmed: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(idx, s)| {
            let name = s.as_ref().trim();
            if name.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    let originals: HashSet<&str> = trimmed.iter().map(String::as_str).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(trimmed.len());
    let mut out = Vec::with_capacity(trimmed.len());
    for name in &trimmed {
        if taken.insert(name.clone()) {
            out.push(name.clone());
            continue;
        }
        let mut k = 2usize;
        loop {
            let candidate = format!("{name}_{k}");
            if !originals.contains(candidate.as_str()) && !taken.contains(&candidate) {
                taken.insert(candidate.clone());
                out.push(candidate);
                break;
            }
            k += 1;
        }
    }
    out
}
