//! Schema validation over row records.
//!
//! A [`Schema`] is an ordered mapping `column -> rules`, usually loaded from JSON:
//!
//! ```json
//! {
//!   "id":   {"required": true, "unique": true, "type": "integer"},
//!   "age":  {"type": "number", "min": 0, "max": 120},
//!   "name": {"required": true, "type": "string", "regex": "^[A-Z]"}
//! }
//! ```
//!
//! [`validate`] checks every record against every column's rules and reports one
//! [`ValidationIssue`] per failed rule, with the number of offending rows and up to
//! [`MAX_EXAMPLES`] example row indices (0-based).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{InspectError, InspectResult};
use crate::types::{Record, Value, ValueKey};

/// Maximum number of example row indices kept per issue.
pub const MAX_EXAMPLES: usize = 5;

/// Logical value type a column may be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `Int64` only.
    Integer,
    /// `Int64` or `Float64`.
    Number,
    /// `Utf8`.
    String,
    /// `Bool`.
    Boolean,
}

impl ValueType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueType::Integer => matches!(value, Value::Int64(_)),
            ValueType::Number => value.is_numeric(),
            ValueType::String => matches!(value, Value::Utf8(_)),
            ValueType::Boolean => matches!(value, Value::Bool(_)),
        }
    }
}

/// Rules for one column. Every rule is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRules {
    /// The key must be present with a non-null value.
    #[serde(default)]
    pub required: bool,
    /// Non-null values must not repeat.
    #[serde(default)]
    pub unique: bool,
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    /// Inclusive lower bound for numeric values.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric values.
    #[serde(default)]
    pub max: Option<f64>,
    /// Allowed JSON scalars; numbers compare by value.
    #[serde(default)]
    pub allowed_values: Option<Vec<JsonValue>>,
    /// Pattern string values must contain a match for.
    #[serde(default)]
    pub regex: Option<String>,
    /// `Some(false)` rejects keys that are present with a null value.
    #[serde(default)]
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone)]
struct ColumnSchema {
    name: String,
    rules: ColumnRules,
    pattern: Option<Regex>,
}

/// Ordered column rules, checked in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
}

impl Schema {
    /// Build a schema from `(column, rules)` pairs, compiling `regex` rules.
    pub fn new<I, S>(columns: I) -> InspectResult<Self>
    where
        I: IntoIterator<Item = (S, ColumnRules)>,
        S: Into<String>,
    {
        let mut out: Vec<ColumnSchema> = Vec::new();
        for (name, rules) in columns {
            let name = name.into();
            if out.iter().any(|c| c.name == name) {
                return Err(InspectError::configuration(format!(
                    "column '{name}' appears twice in the schema"
                )));
            }
            let pattern = match rules.regex.as_deref() {
                Some(re) => Some(Regex::new(re).map_err(|e| {
                    InspectError::configuration(format!("invalid regex for column '{name}': {e}"))
                })?),
                None => None,
            };
            out.push(ColumnSchema {
                name,
                rules,
                pattern,
            });
        }
        Ok(Self { columns: out })
    }

    /// Parse a schema from JSON text; column order follows the document.
    pub fn from_json_str(input: &str) -> InspectResult<Self> {
        let doc: Map<String, JsonValue> = serde_json::from_str(input)
            .map_err(|e| InspectError::configuration(format!("invalid schema JSON: {e}")))?;
        let mut columns = Vec::with_capacity(doc.len());
        for (name, raw) in doc {
            let rules: ColumnRules = serde_json::from_value(raw).map_err(|e| {
                InspectError::configuration(format!("invalid rules for column '{name}': {e}"))
            })?;
            columns.push((name, rules));
        }
        Self::new(columns)
    }

    /// Read and parse a schema file.
    pub fn from_path(path: impl AsRef<Path>) -> InspectResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Column names in check order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Rules for `column`, if the schema names it.
    pub fn rules(&self, column: &str) -> Option<&ColumnRules> {
        self.columns.iter().find(|c| c.name == column).map(|c| &c.rules)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

/// Machine-readable issue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    MissingRequired,
    Duplicate,
    OutOfRange,
    NullNotAllowed,
    TypeMismatch,
    NotAllowed,
    PatternMismatch,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::MissingRequired => "missing_required",
            IssueCode::Duplicate => "duplicate",
            IssueCode::OutOfRange => "out_of_range",
            IssueCode::NullNotAllowed => "null_not_allowed",
            IssueCode::TypeMismatch => "type_mismatch",
            IssueCode::NotAllowed => "not_allowed",
            IssueCode::PatternMismatch => "pattern_mismatch",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub column: String,
    /// Number of offending rows.
    pub count: usize,
    /// First offending row indices (0-based), at most [`MAX_EXAMPLES`].
    pub examples: Vec<usize>,
}

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub row_count: usize,
    /// Number of distinct keys across all records.
    pub column_count: usize,
    /// Issues in schema column order, then rule order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check `records` against `schema`.
///
/// Rule order per column: `required`, `unique`, `min`, `max`, `nullable`, `type`,
/// `allowed_values`, `regex`. Range checks only look at numeric values; `type`,
/// `allowed_values` and `regex` only look at non-null values.
pub fn validate(records: &[Record], schema: &Schema) -> ValidationReport {
    let column_count = records
        .iter()
        .flat_map(|r| r.keys())
        .collect::<HashSet<_>>()
        .len();

    let mut issues = Vec::new();
    for col in &schema.columns {
        check_column(records, col, &mut issues);
    }

    ValidationReport {
        row_count: records.len(),
        column_count,
        issues,
    }
}

fn check_column(records: &[Record], col: &ColumnSchema, issues: &mut Vec<ValidationIssue>) {
    let rules = &col.rules;
    // `None` = key absent, `Some(None)` = present but null.
    let cells: Vec<Option<Option<&Value>>> = records
        .iter()
        .map(|r| r.get(&col.name).map(Option::as_ref))
        .collect();
    let mut push = |code: IssueCode, rows: Vec<usize>| {
        if !rows.is_empty() {
            issues.push(ValidationIssue {
                code,
                column: col.name.clone(),
                count: rows.len(),
                examples: rows.into_iter().take(MAX_EXAMPLES).collect(),
            });
        }
    };

    if rules.required {
        push(
            IssueCode::MissingRequired,
            rows_where(&cells, |c| c.flatten().is_none()),
        );
    }

    if rules.unique {
        let mut seen: HashSet<ValueKey> = HashSet::new();
        let dupes = rows_where(&cells, |c| match c.flatten() {
            Some(v) => !seen.insert(ValueKey::of(v)),
            None => false,
        });
        push(IssueCode::Duplicate, dupes);
    }

    if rules.min.is_some() || rules.max.is_some() {
        let numeric = |c: Option<Option<&Value>>| c.flatten().and_then(Value::as_f64);
        if let Some(min) = rules.min {
            push(
                IssueCode::OutOfRange,
                rows_where(&cells, |c| numeric(c).is_some_and(|x| x < min)),
            );
        }
        if let Some(max) = rules.max {
            push(
                IssueCode::OutOfRange,
                rows_where(&cells, |c| numeric(c).is_some_and(|x| x > max)),
            );
        }
    }

    if rules.nullable == Some(false) {
        push(
            IssueCode::NullNotAllowed,
            rows_where(&cells, |c| matches!(c, Some(None))),
        );
    }

    if let Some(ty) = rules.value_type {
        push(
            IssueCode::TypeMismatch,
            rows_where(&cells, |c| c.flatten().is_some_and(|v| !ty.accepts(v))),
        );
    }

    if let Some(allowed) = &rules.allowed_values {
        let allowed: HashSet<ValueKey> = allowed.iter().filter_map(json_scalar_key).collect();
        push(
            IssueCode::NotAllowed,
            rows_where(&cells, |c| {
                c.flatten()
                    .is_some_and(|v| !allowed.contains(&ValueKey::of(v)))
            }),
        );
    }

    if let Some(re) = &col.pattern {
        push(
            IssueCode::PatternMismatch,
            rows_where(&cells, |c| match c.flatten() {
                Some(Value::Utf8(s)) => !re.is_match(s),
                _ => false,
            }),
        );
    }
}

fn rows_where<'a>(
    cells: &[Option<Option<&'a Value>>],
    mut pred: impl FnMut(Option<Option<&'a Value>>) -> bool,
) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter_map(|(i, c)| pred(*c).then_some(i))
        .collect()
}

fn json_scalar_key(v: &JsonValue) -> Option<ValueKey> {
    let value = match v {
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64()?),
        },
        JsonValue::String(s) => Value::Utf8(s.clone()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => return None,
    };
    Some(ValueKey::of(&value))
}
