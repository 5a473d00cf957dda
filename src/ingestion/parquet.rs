//! Columnar (`.parquet`) decoder.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use parquet::file::reader::FileReader;
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::Field;
use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::types::{Cell, Table, Value};

use super::source;

/// Options for [`read_parquet_from_path`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParquetOptions {
    /// Subset of top-level columns to return, in this order. `None` = all, in schema order.
    pub columns: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl ParquetOptions {
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read a Parquet file into a [`Table`].
///
/// Notes:
/// - requested columns are checked against the file's top-level fields before any row is read
/// - values without a native [`Value`] counterpart (dates, decimals, nested groups, ...) are kept
///   as their parquet display string
pub fn read_parquet_from_path(path: impl AsRef<Path>, options: &ParquetOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    source::require_uncompressed(path, "parquet")?;
    debug!(path = %path.display(), columns = ?options.columns, "reading parquet");

    let reader = SerializedFileReader::new(File::open(path)?)?;
    let available: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let columns = match &options.columns {
        None => available,
        Some(requested) => {
            if let Some(missing) = requested.iter().find(|c| !available.contains(*c)) {
                return Err(InspectError::configuration(format!(
                    "unknown parquet column '{missing}'. available={available:?}"
                )));
            }
            if let Some((idx, dup)) = requested
                .iter()
                .enumerate()
                .find(|(idx, c)| requested[..*idx].contains(*c))
            {
                return Err(InspectError::configuration(format!(
                    "parquet column '{dup}' requested twice (position {idx})"
                )));
            }
            requested.clone()
        }
    };

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for row_res in reader.into_iter() {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let row = row_res?;
        let by_name: HashMap<&str, &Field> = row
            .get_column_iter()
            .map(|(name, field)| (name.as_str(), field))
            .collect();
        rows.push(
            columns
                .iter()
                .map(|c| by_name.get(c.as_str()).and_then(|f| convert_parquet_field(f)))
                .collect(),
        );
    }

    debug!(rows = rows.len(), columns = columns.len(), "parquet decoded");
    Table::new(columns, rows)
}

fn convert_parquet_field(f: &Field) -> Cell {
    match f {
        Field::Null => None,
        Field::Bool(b) => Some(Value::Bool(*b)),
        Field::Byte(v) => Some(Value::Int64(i64::from(*v))),
        Field::Short(v) => Some(Value::Int64(i64::from(*v))),
        Field::Int(v) => Some(Value::Int64(i64::from(*v))),
        Field::Long(v) => Some(Value::Int64(*v)),
        Field::UByte(v) => Some(Value::Int64(i64::from(*v))),
        Field::UShort(v) => Some(Value::Int64(i64::from(*v))),
        Field::UInt(v) => Some(Value::Int64(i64::from(*v))),
        Field::ULong(v) => Some(match i64::try_from(*v) {
            Ok(i) => Value::Int64(i),
            Err(_) => Value::Float64(*v as f64),
        }),
        Field::Float16(v) => Some(Value::Float64(v.to_f64())),
        Field::Float(v) => Some(Value::Float64(f64::from(*v))),
        Field::Double(v) => Some(Value::Float64(*v)),
        Field::Str(s) => Some(Value::Utf8(s.clone())),
        Field::Bytes(b) => Some(Value::Bytes(b.data().to_vec())),
        other => Some(Value::Utf8(other.to_string())),
    }
}
