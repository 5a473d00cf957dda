//! `tabinspect` loads tabular files of many formats into one normalized in-memory [`types::Table`],
//! then profiles, validates and charts it.
//!
//! The primary entrypoint is [`ingestion::read_from_path`], which detects the format from the
//! file extension chain (or an explicit hint) and routes the file to the matching decoder.
//!
//! ## What you can read
//!
//! **File formats (auto-detected by extension, case-insensitive):**
//!
//! - **Delimited text**: `.csv`, `.tsv`
//! - **JSON**: `.json` (array of objects) and `.jsonl` (one object per line)
//! - **Spreadsheets** (requires the Cargo feature `excel`, on by default): `.xlsx`
//! - **Parquet**: `.parquet`
//! - **SQLite**: `.sqlite`, `.db`
//! - **HTML tables**: `.html`, `.htm`
//!
//! Text and JSON inputs may be wrapped in `.gz` or `.zip` (`data.csv.gz` reads as CSV).
//!
//! Missing values (empty text cells, JSON `null`, SQL `NULL`) become `None` cells.
//!
//! ## Quick example: read, profile, validate
//!
//! ```no_run
//! use tabinspect::ingestion::{read_from_path, ReadOptions};
//! use tabinspect::validation::{validate, Schema};
//!
//! # fn main() -> Result<(), tabinspect::InspectError> {
//! let table = read_from_path("people.csv", &ReadOptions::default())?;
//! let profile = table.profile(3);
//! println!("rows={} numeric={}", profile.rows, profile.numeric.len());
//!
//! let schema = Schema::from_json_str(r#"{"name": {"required": true}}"#)?;
//! let report = validate(&table.records(), &schema);
//! for issue in &report.issues {
//!     println!("{} {} {}", issue.code, issue.column, issue.count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format detection, decoder registry, per-format decoders and the unified read
//! - [`types`]: the normalized table and its cell values
//! - [`profiling`]: numeric/categorical column summaries
//! - [`validation`]: rule checks against a JSON schema
//! - [`chart`]: histogram and top-k bar chart data, rendered as SVG
//! - [`report`]: Markdown report combining the above
//! - [`error`]: the error type shared by everything

pub mod chart;
pub mod error;
pub mod ingestion;
pub mod profiling;
pub mod report;
pub mod types;
pub mod validation;

pub use error::{ErrorKind, InspectError, InspectResult};
