//! Read entrypoints and format decoders.
//!
//! Most callers should use [`read_from_path`] (from [`unified`]) which:
//!
//! - detects the format from the extension chain (or an explicit hint), see [`detect()`]
//! - routes the format tag to a decoder, see [`resolve`]
//! - decodes into a normalized [`crate::types::Table`]
//! - optionally reports success/failure/alerts to a [`ReadObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - [`excel`] (cargo feature `excel`)
//! - [`parquet`]
//! - [`sqlite`]
//! - [`html`]

pub mod csv;
pub mod detect;
#[cfg(feature = "excel")]
pub mod excel;
pub mod html;
pub mod json;
pub mod observability;
pub mod parquet;
pub mod registry;
pub mod source;
pub mod sqlite;
pub mod unified;

pub use self::csv::{CsvOptions, DEFAULT_DELIMITER_CSV, DEFAULT_DELIMITER_TSV};
pub use self::detect::{detect, Compression, FormatTag};
#[cfg(feature = "excel")]
pub use self::excel::{ExcelOptions, SheetSelector};
pub use self::html::HtmlOptions;
pub use self::json::JsonOptions;
pub use self::observability::{
    JsonLinesObserver, ReadContext, ReadObserver, ReadStats, Severity, TracingObserver,
};
pub use self::parquet::ParquetOptions;
#[cfg(not(feature = "excel"))]
pub use self::registry::ExcelOptions;
pub use self::registry::{resolve, DecodeOptions, Decoder, DecoderKind};
pub use self::sqlite::SqliteOptions;
pub use self::unified::{read_from_path, ReadOptions, ReadRequest};
