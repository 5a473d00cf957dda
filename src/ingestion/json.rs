//! JSON-family decoder.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Line-delimited JSON (JSONL): `{"a":1}\n{"a":2}\n`
//!
//! Columns are discovered in first-seen key order across all kept records; a key that shows up
//! late still becomes a column and earlier records get `None` for it. Keys are cleaned up the
//! same way delimited headers are, so an empty key reads as `column_<n>`.

use std::path::Path;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::types::{normalize_column_names, Cell, Table, Value};

use super::detect::inner_extension;
use super::source::{self, DEFAULT_ENCODING};

/// Options for [`read_json_from_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonOptions {
    /// Force line-delimited mode regardless of the extension.
    pub lines: bool,
    /// Text encoding label (WHATWG).
    pub encoding: String,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            lines: false,
            encoding: DEFAULT_ENCODING.to_string(),
            limit: None,
        }
    }
}

impl JsonOptions {
    pub fn with_lines(mut self, lines: bool) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> InspectResult<()> {
        source::resolve_encoding(&self.encoding).map(|_| ())
    }

    /// `true` if `path` is read in line-delimited mode.
    pub fn line_mode(&self, path: &Path) -> bool {
        self.lines || inner_extension(path).as_deref() == Some("jsonl")
    }
}

/// Read a JSON or JSONL file (optionally `.gz`/`.zip` wrapped) into a [`Table`].
pub fn read_json_from_path(path: impl AsRef<Path>, options: &JsonOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    options.validate()?;
    let line_mode = options.line_mode(path);
    debug!(path = %path.display(), line_mode, "reading json");

    let text = source::read_text(path, &options.encoding)?;
    if line_mode {
        read_jsonl_from_str(&text, options.limit)
    } else {
        read_json_records_from_str(&text, options.limit)
    }
}

/// Parse line-delimited JSON. Blank lines are skipped; errors carry the 1-based line number.
pub fn read_jsonl_from_str(input: &str, limit: Option<usize>) -> InspectResult<Table> {
    let mut records: Vec<Map<String, JsonValue>> = Vec::new();
    for (idx0, line) in input.lines().enumerate() {
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        let line_no = idx0 + 1;
        if line.trim().is_empty() {
            continue;
        }
        let v: JsonValue = serde_json::from_str(line).map_err(|e| {
            InspectError::file_format(format!("invalid JSON on line {line_no}: {e}"))
        })?;
        match v {
            JsonValue::Object(obj) => records.push(obj),
            other => {
                return Err(InspectError::file_format(format!(
                    "line {line_no}: expected one JSON object per line, got {}",
                    json_kind(&other)
                )));
            }
        }
    }
    records_to_table(records)
}

/// Parse a JSON document that must be an array of objects.
pub fn read_json_records_from_str(input: &str, limit: Option<usize>) -> InspectResult<Table> {
    let v: JsonValue = serde_json::from_str(input)
        .map_err(|e| InspectError::file_format(format!("invalid JSON: {e}")))?;

    let JsonValue::Array(items) = v else {
        return Err(InspectError::file_format(format!(
            "records JSON must be an array of objects, got {}",
            json_kind(&v)
        )));
    };

    let mut records: Vec<Map<String, JsonValue>> = Vec::with_capacity(items.len());
    for (idx0, item) in items.into_iter().enumerate() {
        match item {
            JsonValue::Object(obj) => records.push(obj),
            other => {
                return Err(InspectError::file_format(format!(
                    "records JSON must be an array of objects; element {idx0} is {}",
                    json_kind(&other)
                )));
            }
        }
    }
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records_to_table(records)
}

fn records_to_table(records: Vec<Map<String, JsonValue>>) -> InspectResult<Table> {
    let mut keys: Vec<String> = Vec::new();
    for rec in &records {
        for key in rec.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.clone());
            }
        }
    }
    let columns = normalize_column_names(&keys);

    let rows: Vec<Vec<Cell>> = records
        .into_iter()
        .map(|mut rec| {
            keys.iter()
                .map(|c| rec.remove(c).and_then(convert_json_value))
                .collect()
        })
        .collect();

    debug!(rows = rows.len(), columns = columns.len(), "json decoded");
    Table::new(columns, rows)
}

fn convert_json_value(v: JsonValue) -> Cell {
    match v {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Bool(b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int64(i))
            } else {
                n.as_f64().map(Value::Float64)
            }
        }
        JsonValue::String(s) => Some(Value::Utf8(s)),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Some(Value::Utf8(nested.to_string())),
    }
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{read_json_records_from_str, read_jsonl_from_str};
    use crate::error::ErrorKind;
    use crate::types::Value;

    #[test]
    fn empty_key_gets_a_positional_name() {
        let t = read_json_records_from_str(r#"[{"": 1, "a": 2}, {"a": 3}]"#, None).unwrap();
        assert_eq!(t.columns(), &["column_1".to_string(), "a".to_string()]);
        assert_eq!(t.get(0, "column_1"), Some(&Some(Value::Int64(1))));
        assert_eq!(t.get(1, "column_1"), Some(&None));
        assert_eq!(t.get(1, "a"), Some(&Some(Value::Int64(3))));
    }

    #[test]
    fn late_keys_become_columns_and_backfill_null() {
        let t = read_json_records_from_str(r#"[{"id":1},{"id":2,"name":"Bob"}]"#, None).unwrap();
        assert_eq!(t.columns(), &["id".to_string(), "name".to_string()]);
        assert_eq!(t.get(0, "name"), Some(&None));
        assert_eq!(t.get(1, "name"), Some(&Some(Value::Utf8("Bob".to_string()))));
    }

    #[test]
    fn key_order_follows_the_document() {
        let t = read_json_records_from_str(r#"[{"zeta":1,"alpha":2}]"#, None).unwrap();
        assert_eq!(t.columns(), &["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn jsonl_reports_line_number_of_bad_syntax() {
        let err = read_jsonl_from_str("{\"a\":1}\n\n{oops}\n", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileFormat);
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn jsonl_rejects_non_object_lines() {
        let err = read_jsonl_from_str("{\"a\":1}\n[1,2]\n", None).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn records_mode_requires_array_of_objects() {
        assert!(read_json_records_from_str(r#"{"a":1}"#, None).is_err());
        assert!(read_json_records_from_str(r#"[{"a":1}, 2]"#, None).is_err());
        assert!(read_json_records_from_str("[", None).is_err());
    }

    #[test]
    fn nested_values_are_kept_as_json_text() {
        let t = read_json_records_from_str(r#"[{"user":{"name":"Ada"},"tags":[1,2]}]"#, None).unwrap();
        assert_eq!(
            t.get(0, "user"),
            Some(&Some(Value::Utf8(r#"{"name":"Ada"}"#.to_string())))
        );
        assert_eq!(t.get(0, "tags"), Some(&Some(Value::Utf8("[1,2]".to_string()))));
    }

    #[test]
    fn limit_applies_to_both_modes() {
        let t = read_jsonl_from_str("{\"a\":1}\n\n{\"a\":2}\n{\"a\":3}\n", Some(2)).unwrap();
        assert_eq!(t.row_count(), 2);
        let t = read_json_records_from_str(r#"[{"a":1},{"a":2},{"a":3}]"#, Some(1)).unwrap();
        assert_eq!(t.row_count(), 1);
    }
}
