//! Column profiling over row records.
//!
//! [`summarize`] classifies every column as numeric or categorical and computes small,
//! deterministic summaries. Nulls (absent keys and `None` cells) are counted but never enter
//! `distinct`, the numeric statistics or the top-k list.
//!
//! ```rust
//! use tabinspect::profiling::summarize;
//! use tabinspect::types::{Record, Value};
//!
//! let records: Vec<Record> = [Some(10), None, Some(20), Some(30)]
//!     .into_iter()
//!     .map(|age| [("age".to_string(), age.map(Value::Int64))].into_iter().collect())
//!     .collect();
//!
//! let report = summarize(&records, 3);
//! let age = &report.numeric[0];
//! assert_eq!((age.count, age.nulls, age.distinct), (3, 1, 3));
//! assert_eq!(age.mean, Some(20.0));
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::types::{Record, Table, Value, ValueKey};

/// Summary of a column whose non-null values are all numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    /// Non-null values.
    pub count: usize,
    pub nulls: usize,
    /// Distinct non-null values (`1` and `1.0` are the same value).
    pub distinct: usize,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub mean: Option<f64>,
}

/// Summary of any column that is not numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub nulls: usize,
    pub distinct: usize,
    /// Most frequent values, by count desc then value text asc.
    pub top: Vec<(String, usize)>,
}

/// Result of [`summarize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub rows: usize,
    /// Number of distinct keys across all records.
    pub columns: usize,
    /// Numeric columns, sorted by name.
    pub numeric: Vec<NumericSummary>,
    /// Categorical columns, sorted by name.
    pub categorical: Vec<CategoricalSummary>,
}

/// Profile `records`, keeping the `top_k` most frequent values of categorical columns.
///
/// A column is numeric when it has at least one non-null value and every non-null value is an
/// `Int64` or `Float64`. Booleans and all-null columns are categorical.
pub fn summarize(records: &[Record], top_k: usize) -> ProfileReport {
    let rows = records.len();
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for column in &columns {
        let values: Vec<&Value> = records
            .iter()
            .filter_map(|r| r.get(*column).and_then(Option::as_ref))
            .collect();

        if !values.is_empty() && values.iter().all(|v| v.is_numeric()) {
            numeric.push(numeric_summary(column, rows, &values));
        } else {
            categorical.push(CategoricalSummary {
                column: column.to_string(),
                count: values.len(),
                nulls: rows - values.len(),
                distinct: distinct_count(&values),
                top: top_values(values.iter().copied(), top_k),
            });
        }
    }

    ProfileReport {
        rows,
        columns: columns.len(),
        numeric,
        categorical,
    }
}

fn numeric_summary(column: &str, rows: usize, values: &[&Value]) -> NumericSummary {
    let mut min: Option<(&Value, f64)> = None;
    let mut max: Option<(&Value, f64)> = None;
    let mut sum = 0.0f64;
    for v in values {
        let Some(x) = v.as_f64() else { continue };
        sum += x;
        if min.is_none_or(|(_, m)| x < m) {
            min = Some((*v, x));
        }
        if max.is_none_or(|(_, m)| x > m) {
            max = Some((*v, x));
        }
    }

    let count = values.len();
    NumericSummary {
        column: column.to_string(),
        count,
        nulls: rows - count,
        distinct: distinct_count(values),
        min: min.map(|(v, _)| v.clone()),
        max: max.map(|(v, _)| v.clone()),
        mean: (count > 0).then(|| sum / count as f64),
    }
}

fn distinct_count(values: &[&Value]) -> usize {
    values
        .iter()
        .map(|v| ValueKey::of(v))
        .collect::<HashSet<_>>()
        .len()
}

/// Count values and keep the `k` most frequent as `(display text, count)`.
///
/// Ordering: count descending, then display text ascending. Equal values (see [`Value`]
/// equality rules for numbers) are counted together under the text of their first occurrence.
pub fn top_values<'a>(values: impl IntoIterator<Item = &'a Value>, k: usize) -> Vec<(String, usize)> {
    let mut slots: HashMap<ValueKey, usize> = HashMap::new();
    let mut counted: Vec<(String, usize)> = Vec::new();
    for v in values {
        let key = ValueKey::of(v);
        match slots.get(&key) {
            Some(&idx) => counted[idx].1 += 1,
            None => {
                slots.insert(key, counted.len());
                counted.push((v.to_string(), 1));
            }
        }
    }
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counted.truncate(k);
    counted
}

impl Table {
    /// Profile this table; see [`summarize`].
    pub fn profile(&self, top_k: usize) -> ProfileReport {
        summarize(&self.records(), top_k)
    }
}
