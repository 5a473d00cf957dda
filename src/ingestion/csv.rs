//! Delimited-text (CSV/TSV) decoder.

use std::path::Path;

use tracing::{debug, trace};

use crate::error::{InspectError, InspectResult};
use crate::types::{normalize_column_names, Cell, Table, Value};

use super::detect::inner_extension;
use super::source::{self, DEFAULT_ENCODING};

/// Default delimiter for `.csv` (and anything that is not `.tsv`).
pub const DEFAULT_DELIMITER_CSV: char = ',';
/// Default delimiter for `.tsv`.
pub const DEFAULT_DELIMITER_TSV: char = '\t';

/// Options for [`read_csv_from_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Field delimiter. If `None`: tab for `.tsv` files, otherwise comma.
    pub delimiter: Option<char>,
    /// Quote character.
    pub quote: char,
    /// Number of leading records to skip before the header record.
    pub header_row: usize,
    /// Text encoding label (WHATWG), e.g. `utf-8`, `latin1`.
    pub encoding: String,
    /// Decimal mark used when `infer_types` is on.
    pub decimal: char,
    /// Thousands separator stripped when `infer_types` is on.
    pub thousands: Option<char>,
    /// Parse numeric/boolean-looking cells into typed values instead of keeping strings.
    pub infer_types: bool,
    /// Maximum number of (valid) rows to return.
    pub limit: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: '"',
            header_row: 0,
            encoding: DEFAULT_ENCODING.to_string(),
            decimal: '.',
            thousands: None,
            infer_types: false,
            limit: None,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_infer_types(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check option consistency without touching the filesystem.
    pub fn validate(&self) -> InspectResult<()> {
        if let Some(d) = self.delimiter {
            ascii_byte("delimiter", d)?;
            if d == self.quote {
                return Err(InspectError::configuration(format!(
                    "delimiter and quote character must differ (both {d:?})"
                )));
            }
        }
        ascii_byte("quote character", self.quote)?;
        if Some(self.decimal) == self.thousands {
            return Err(InspectError::configuration(format!(
                "decimal mark and thousands separator must differ (both {:?})",
                self.decimal
            )));
        }
        source::resolve_encoding(&self.encoding)?;
        Ok(())
    }

    /// Delimiter actually used for `path`: explicit > `.tsv` -> tab > comma.
    pub fn effective_delimiter(&self, path: &Path) -> char {
        match self.delimiter {
            Some(d) => d,
            None if inner_extension(path).as_deref() == Some("tsv") => DEFAULT_DELIMITER_TSV,
            None => DEFAULT_DELIMITER_CSV,
        }
    }
}

fn ascii_byte(what: &str, c: char) -> InspectResult<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(InspectError::configuration(format!(
            "{what} must be a single ASCII character, got {c:?}"
        )))
    }
}

/// Read a CSV/TSV file (optionally `.gz`/`.zip` wrapped) into a [`Table`].
///
/// Rules:
///
/// - `header_row` records are skipped, the next record is the header
/// - a record whose cell count differs from the header is skipped
/// - a record whose cells are all empty is skipped
/// - empty cells become `None`
/// - `limit` counts only rows that survive the skipping
pub fn read_csv_from_path(path: impl AsRef<Path>, options: &CsvOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    options.validate()?;
    let delimiter = options.effective_delimiter(path);
    debug!(path = %path.display(), ?delimiter, header_row = options.header_row, "reading delimited text");

    let text = source::read_text(path, &options.encoding)?;
    read_csv_from_str(&text, delimiter, options)
}

/// Read delimited text that is already in memory.
pub fn read_csv_from_str(input: &str, delimiter: char, options: &CsvOptions) -> InspectResult<Table> {
    let delimiter = ascii_byte("delimiter", delimiter)?;
    let quote = ascii_byte("quote character", options.quote)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(quote)
        .from_reader(input.as_bytes());

    let mut records = rdr.records();
    for _ in 0..options.header_row {
        if records.next().transpose()?.is_none() {
            break;
        }
    }
    let header = records.next().transpose()?.ok_or_else(|| {
        InspectError::file_format(format!(
            "no header row found (header_row={})",
            options.header_row
        ))
    })?;
    let columns = normalize_column_names(header.iter());

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut skipped = 0usize;
    for result in records {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let record = result?;
        if record.len() != columns.len() {
            trace!(cells = record.len(), expected = columns.len(), "skipping ragged row");
            skipped += 1;
            continue;
        }
        if record.iter().all(str::is_empty) {
            skipped += 1;
            continue;
        }
        rows.push(record.iter().map(|raw| convert_cell(raw, options)).collect());
    }

    debug!(rows = rows.len(), columns = columns.len(), skipped, "delimited text decoded");
    Table::new(columns, rows)
}

fn convert_cell(raw: &str, options: &CsvOptions) -> Cell {
    if raw.is_empty() {
        return None;
    }
    if !options.infer_types {
        return Some(Value::Utf8(raw.to_owned()));
    }
    Some(infer_value(raw, options.decimal, options.thousands))
}

/// Best-effort typed parse of a delimited-text cell: integer, then float, then bool, else string.
pub fn infer_value(raw: &str, decimal: char, thousands: Option<char>) -> Value {
    let trimmed = raw.trim();
    let mut normalized: String = match thousands {
        Some(sep) => trimmed.chars().filter(|&c| c != sep).collect(),
        None => trimmed.to_owned(),
    };
    if decimal != '.' {
        normalized = normalized.replace(decimal, ".");
    }

    if let Ok(v) = normalized.parse::<i64>() {
        return Value::Int64(v);
    }
    if looks_like_number(&normalized) {
        if let Ok(v) = normalized.parse::<f64>() {
            return Value::Float64(v);
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Utf8(raw.to_owned()),
    }
}

// `f64::from_str` also accepts "inf"/"nan"; those stay strings.
fn looks_like_number(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && s.chars().any(|c| c.is_ascii_digit())
}
