use std::error::Error as StdError;

use serde::Serialize;
use thiserror::Error;

/// Convenience result type for reading and inspecting tables.
pub type InspectResult<T> = Result<T, InspectError>;

/// Error type returned by decoders, the unified entrypoint and the schema loader.
///
/// Backend errors are wrapped as-is; [`InspectError::kind`] folds them into the two user-facing
/// categories (file format vs. configuration) plus I/O and engine failures.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet read error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited-text read error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error outside the JSON decoder, e.g. CLI output.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet read error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// SQLite driver error (connection, SQL, missing table, ...).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// The input does not conform to its expected format.
    #[error("file format error: {message}")]
    FileFormat { message: String },

    /// Caller-supplied options are individually or jointly invalid.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse classification of an [`InspectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Corrupt bytes, wrong signature, invalid JSON, missing sheet/table, ...
    FileFormat,
    /// Invalid or conflicting options.
    Configuration,
    /// The file could not be opened or read.
    Io,
    /// A lower-level engine failure (e.g. invalid SQL, missing SQL table).
    Engine,
}

impl InspectError {
    pub(crate) fn file_format(message: impl Into<String>) -> Self {
        Self::FileFormat {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InspectError::Io(_) => ErrorKind::Io,
            InspectError::FileFormat { .. } => ErrorKind::FileFormat,
            InspectError::Configuration { .. } => ErrorKind::Configuration,
            #[cfg(feature = "excel")]
            InspectError::Excel(err) => match err {
                calamine::Error::Io(_) => ErrorKind::Io,
                _ => ErrorKind::FileFormat,
            },
            InspectError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => ErrorKind::Io,
                _ => ErrorKind::FileFormat,
            },
            InspectError::Json(err) => {
                if err.is_io() {
                    ErrorKind::Io
                } else {
                    ErrorKind::FileFormat
                }
            }
            InspectError::Parquet(err) => {
                if error_chain_contains_io(err) {
                    ErrorKind::Io
                } else {
                    ErrorKind::FileFormat
                }
            }
            InspectError::Sqlite(err) => match err {
                sqlx::Error::Io(_) => ErrorKind::Io,
                // SQLITE_NOTADB
                sqlx::Error::Database(db) if db.code().as_deref() == Some("26") => ErrorKind::FileFormat,
                _ => ErrorKind::Engine,
            },
        }
    }

    /// `true` for the two categories callers report as user-facing input problems.
    pub fn is_user_facing(&self) -> bool {
        matches!(self.kind(), ErrorKind::FileFormat | ErrorKind::Configuration)
    }
}

pub(crate) fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
