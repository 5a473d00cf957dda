//! Relational-file (SQLite) decoder.
//!
//! The public API is synchronous. Each read builds a current-thread tokio runtime, drives the
//! `sqlx` connection on it and drops both before returning.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow, SqliteStatement};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::types::{normalize_column_names, Cell, Table, Value};

use super::source;

/// Options for [`read_sqlite_from_path`]. Exactly one of `table` / `query` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqliteOptions {
    /// Read every column of this table.
    pub table: Option<String>,
    /// Run this SQL and read its result set.
    pub query: Option<String>,
    pub limit: Option<usize>,
}

impl SqliteOptions {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            query: Some(sql.into()),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Both or neither of `table`/`query` is a configuration error; empty strings count as unset.
    pub fn validate(&self) -> InspectResult<()> {
        self.select().map(|_| ())
    }

    fn select(&self) -> InspectResult<Select<'_>> {
        match (self.table_name(), self.sql()) {
            (Some(table), None) => Ok(Select::Table(table)),
            (None, Some(sql)) => Ok(Select::Query(sql)),
            (Some(_), Some(_)) => Err(InspectError::configuration(
                "provide either table or query, not both",
            )),
            (None, None) => Err(InspectError::configuration(
                "provide either table or query, not neither",
            )),
        }
    }

    fn table_name(&self) -> Option<&str> {
        self.table.as_deref().filter(|t| !t.is_empty())
    }

    fn sql(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
enum Select<'a> {
    Table(&'a str),
    Query(&'a str),
}

/// Read a table or query result from a SQLite database file into a [`Table`].
///
/// - table mode runs `SELECT * FROM "<table>"`, with `LIMIT ?` bound when `limit` is set
/// - query mode runs the SQL as given and truncates the result to `limit`
///
/// Options are validated before the file is touched. The database is opened read-only.
pub fn read_sqlite_from_path(path: impl AsRef<Path>, options: &SqliteOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    let select = options.select()?;
    source::require_uncompressed(path, "sqlite")?;
    // Surface a missing file as an I/O error instead of a driver error.
    std::fs::metadata(path)?;
    debug!(path = %path.display(), ?select, "reading sqlite");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(read_sqlite_async(path, select, options.limit))
}

async fn read_sqlite_async(path: &Path, select: Select<'_>, limit: Option<usize>) -> InspectResult<Table> {
    let mut conn: SqliteConnection = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .connect()
        .await?;

    let result = fetch_table(&mut conn, select, limit).await;
    // Close errors are not interesting once the rows (or the real error) are in hand.
    let _ = conn.close().await;
    result
}

async fn fetch_table(
    conn: &mut SqliteConnection,
    select: Select<'_>,
    limit: Option<usize>,
) -> InspectResult<Table> {
    let (columns, mut rows): (Vec<String>, Vec<SqliteRow>) = match select {
        Select::Table(table) => {
            let mut sql = format!("SELECT * FROM {}", quote_identifier(table));
            if limit.is_some() {
                sql.push_str(" LIMIT ?");
            }
            let stmt = (&mut *conn).prepare(sql.as_str()).await?;
            let columns = statement_columns(&stmt);
            let mut query = stmt.query();
            if let Some(limit) = limit {
                query = query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
            }
            (columns, query.fetch_all(&mut *conn).await?)
        }
        Select::Query(sql) => {
            let stmt = (&mut *conn).prepare(sql).await?;
            let columns = statement_columns(&stmt);
            let rows = stmt.query().fetch_all(&mut *conn).await?;
            (columns, rows)
        }
    };
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    let rows = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| decode_cell(row, i)).collect())
        .collect::<InspectResult<Vec<Vec<Cell>>>>()?;

    debug!(rows = rows.len(), columns = columns.len(), "sqlite decoded");
    Table::new(columns, rows)
}

// `SELECT a, a ...` is legal SQL; repeated result names are made unique.
fn statement_columns(stmt: &SqliteStatement<'_>) -> Vec<String> {
    normalize_column_names(stmt.columns().iter().map(|c| c.name()))
}

fn decode_cell(row: &SqliteRow, idx: usize) -> InspectResult<Cell> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(None);
    }
    // Dispatch on the storage class of the value itself, not the declared column type.
    let storage = raw.type_info().name().to_string();
    let value = match storage.as_str() {
        "INTEGER" => Value::Int64(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => Value::Float64(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => Value::Utf8(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(Some(value))
}

/// Quote a table name as a SQL identifier (`"` doubled inside).
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::{quote_identifier, read_sqlite_from_path, Select, SqliteOptions};
    use crate::error::ErrorKind;

    #[test]
    fn table_and_query_are_mutually_exclusive() {
        let both = SqliteOptions {
            table: Some("t".to_string()),
            query: Some("SELECT 1".to_string()),
            limit: None,
        };
        assert_eq!(both.validate().unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(
            SqliteOptions::default().validate().unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert!(SqliteOptions::table("t").validate().is_ok());
        assert!(SqliteOptions::query("SELECT 1").validate().is_ok());
    }

    #[test]
    fn select_carries_the_one_source_that_is_set() {
        assert!(matches!(SqliteOptions::table("t").select(), Ok(Select::Table("t"))));
        assert!(matches!(
            SqliteOptions::query("SELECT 1").select(),
            Ok(Select::Query("SELECT 1"))
        ));
        assert!(SqliteOptions::default().select().is_err());
    }

    #[test]
    fn empty_strings_count_as_unset() {
        let opts = SqliteOptions {
            table: Some(String::new()),
            query: Some("SELECT 1".to_string()),
            limit: None,
        };
        assert!(opts.validate().is_ok());
        let opts = SqliteOptions {
            table: Some(String::new()),
            query: Some(String::new()),
            limit: None,
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn conflicting_options_fail_before_touching_the_file() {
        let both = SqliteOptions {
            table: Some("t".to_string()),
            query: Some("SELECT 1".to_string()),
            limit: None,
        };
        let err = read_sqlite_from_path("/definitely/not/here.sqlite", &both).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("people"), "\"people\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
