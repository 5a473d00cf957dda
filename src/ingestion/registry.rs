//! Format tag -> decoder routing.
//!
//! [`resolve`] hands back a [`DecoderKind`]; nothing is opened until [`DecoderKind::read`] runs.

use std::path::Path;

use crate::error::{InspectError, InspectResult};
use crate::types::Table;

use super::csv::{read_csv_from_path, CsvOptions, DEFAULT_DELIMITER_TSV};
use super::detect::FormatTag;
#[cfg(feature = "excel")]
use super::excel::{read_excel_from_path, ExcelOptions};
use super::html::{read_html_from_path, HtmlOptions};
use super::json::{read_json_from_path, JsonOptions};
use super::parquet::{read_parquet_from_path, ParquetOptions};
use super::sqlite::{read_sqlite_from_path, SqliteOptions};

/// A format decoder with its own option type.
pub trait Decoder {
    type Options;

    /// Decode the file at `path` into a normalized [`Table`].
    fn read(&self, path: &Path, options: &Self::Options) -> InspectResult<Table>;
}

/// CSV/TSV decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedDecoder;

/// JSON / JSONL decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

/// Excel workbook decoder.
#[cfg(feature = "excel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetDecoder;

/// Parquet decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnarDecoder;

/// SQLite decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalDecoder;

/// HTML table decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDecoder;

impl Decoder for DelimitedDecoder {
    type Options = CsvOptions;

    fn read(&self, path: &Path, options: &CsvOptions) -> InspectResult<Table> {
        read_csv_from_path(path, options)
    }
}

impl Decoder for JsonDecoder {
    type Options = JsonOptions;

    fn read(&self, path: &Path, options: &JsonOptions) -> InspectResult<Table> {
        read_json_from_path(path, options)
    }
}

#[cfg(feature = "excel")]
impl Decoder for SpreadsheetDecoder {
    type Options = ExcelOptions;

    fn read(&self, path: &Path, options: &ExcelOptions) -> InspectResult<Table> {
        read_excel_from_path(path, options)
    }
}

impl Decoder for ColumnarDecoder {
    type Options = ParquetOptions;

    fn read(&self, path: &Path, options: &ParquetOptions) -> InspectResult<Table> {
        read_parquet_from_path(path, options)
    }
}

impl Decoder for RelationalDecoder {
    type Options = SqliteOptions;

    fn read(&self, path: &Path, options: &SqliteOptions) -> InspectResult<Table> {
        read_sqlite_from_path(path, options)
    }
}

impl Decoder for HtmlDecoder {
    type Options = HtmlOptions;

    fn read(&self, path: &Path, options: &HtmlOptions) -> InspectResult<Table> {
        read_html_from_path(path, options)
    }
}

/// Handle to the decoder responsible for a format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    /// csv, tsv
    Delimited,
    /// json, jsonl
    Json,
    /// xlsx
    Spreadsheet,
    /// parquet
    Columnar,
    /// sqlite
    Relational,
    /// html
    Html,
}

/// Look up the decoder for a format tag (case-insensitive). Unknown or empty tags give `None`.
pub fn resolve(tag: &str) -> Option<DecoderKind> {
    FormatTag::parse(tag).map(DecoderKind::for_tag)
}

impl DecoderKind {
    pub fn for_tag(tag: FormatTag) -> Self {
        match tag {
            FormatTag::Csv | FormatTag::Tsv => DecoderKind::Delimited,
            FormatTag::Json | FormatTag::Jsonl => DecoderKind::Json,
            FormatTag::Xlsx => DecoderKind::Spreadsheet,
            FormatTag::Parquet => DecoderKind::Columnar,
            FormatTag::Sqlite => DecoderKind::Relational,
            FormatTag::Html => DecoderKind::Html,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DecoderKind::Delimited => "delimited",
            DecoderKind::Json => "json",
            DecoderKind::Spreadsheet => "spreadsheet",
            DecoderKind::Columnar => "columnar",
            DecoderKind::Relational => "relational",
            DecoderKind::Html => "html",
        }
    }

    /// Decode `path` with `options`, which must be the variant belonging to this decoder.
    pub fn read(self, path: impl AsRef<Path>, options: &DecodeOptions) -> InspectResult<Table> {
        let path = path.as_ref();
        match (self, options) {
            (DecoderKind::Delimited, DecodeOptions::Csv(o)) => DelimitedDecoder.read(path, o),
            (DecoderKind::Json, DecodeOptions::Json(o)) => JsonDecoder.read(path, o),
            #[cfg(feature = "excel")]
            (DecoderKind::Spreadsheet, DecodeOptions::Excel(o)) => SpreadsheetDecoder.read(path, o),
            #[cfg(not(feature = "excel"))]
            (DecoderKind::Spreadsheet, DecodeOptions::Excel(_)) => Err(InspectError::configuration(
                "xlsx support is disabled (build with the `excel` feature)",
            )),
            (DecoderKind::Columnar, DecodeOptions::Parquet(o)) => ColumnarDecoder.read(path, o),
            (DecoderKind::Relational, DecodeOptions::Sqlite(o)) => RelationalDecoder.read(path, o),
            (DecoderKind::Html, DecodeOptions::Html(o)) => HtmlDecoder.read(path, o),
            (kind, other) => Err(InspectError::configuration(format!(
                "{} options cannot be used with the {} decoder",
                other.name(),
                kind.name()
            ))),
        }
    }
}

/// Spreadsheet options stand-in when the `excel` feature is off.
#[cfg(not(feature = "excel"))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExcelOptions {
    pub limit: Option<usize>,
}

/// Per-decoder options, one variant per [`DecoderKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOptions {
    Csv(CsvOptions),
    Json(JsonOptions),
    Excel(ExcelOptions),
    Parquet(ParquetOptions),
    Sqlite(SqliteOptions),
    Html(HtmlOptions),
}

impl DecodeOptions {
    /// Default options for a format tag; `None` for an unknown tag.
    ///
    /// `tsv` selects the tab delimiter and `jsonl` turns on line mode, so hinted reads of paths
    /// with some other extension still split the way the tag says.
    pub fn defaults_for(tag: &str) -> Option<Self> {
        let tag = FormatTag::parse(tag)?;
        Some(match tag {
            FormatTag::Csv => DecodeOptions::Csv(CsvOptions::default()),
            FormatTag::Tsv => {
                DecodeOptions::Csv(CsvOptions::default().with_delimiter(DEFAULT_DELIMITER_TSV))
            }
            FormatTag::Json => DecodeOptions::Json(JsonOptions::default()),
            FormatTag::Jsonl => DecodeOptions::Json(JsonOptions::default().with_lines(true)),
            FormatTag::Xlsx => DecodeOptions::Excel(ExcelOptions::default()),
            FormatTag::Parquet => DecodeOptions::Parquet(ParquetOptions::default()),
            FormatTag::Sqlite => DecodeOptions::Sqlite(SqliteOptions::default()),
            FormatTag::Html => DecodeOptions::Html(HtmlOptions::default()),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            DecodeOptions::Csv(_) => "csv",
            DecodeOptions::Json(_) => "json",
            DecodeOptions::Excel(_) => "xlsx",
            DecodeOptions::Parquet(_) => "parquet",
            DecodeOptions::Sqlite(_) => "sqlite",
            DecodeOptions::Html(_) => "html",
        }
    }

    /// Row limit of whichever variant this is.
    pub fn limit(&self) -> Option<usize> {
        match self {
            DecodeOptions::Csv(o) => o.limit,
            DecodeOptions::Json(o) => o.limit,
            DecodeOptions::Excel(o) => o.limit,
            DecodeOptions::Parquet(o) => o.limit,
            DecodeOptions::Sqlite(o) => o.limit,
            DecodeOptions::Html(o) => o.limit,
        }
    }

    /// Override the row limit of whichever variant this is.
    pub fn with_limit(mut self, limit: usize) -> Self {
        let slot = match &mut self {
            DecodeOptions::Csv(o) => &mut o.limit,
            DecodeOptions::Json(o) => &mut o.limit,
            DecodeOptions::Excel(o) => &mut o.limit,
            DecodeOptions::Parquet(o) => &mut o.limit,
            DecodeOptions::Sqlite(o) => &mut o.limit,
            DecodeOptions::Html(o) => &mut o.limit,
        };
        *slot = Some(limit);
        self
    }
}

impl From<CsvOptions> for DecodeOptions {
    fn from(o: CsvOptions) -> Self {
        DecodeOptions::Csv(o)
    }
}

impl From<JsonOptions> for DecodeOptions {
    fn from(o: JsonOptions) -> Self {
        DecodeOptions::Json(o)
    }
}

impl From<ExcelOptions> for DecodeOptions {
    fn from(o: ExcelOptions) -> Self {
        DecodeOptions::Excel(o)
    }
}

impl From<ParquetOptions> for DecodeOptions {
    fn from(o: ParquetOptions) -> Self {
        DecodeOptions::Parquet(o)
    }
}

impl From<SqliteOptions> for DecodeOptions {
    fn from(o: SqliteOptions) -> Self {
        DecodeOptions::Sqlite(o)
    }
}

impl From<HtmlOptions> for DecodeOptions {
    fn from(o: HtmlOptions) -> Self {
        DecodeOptions::Html(o)
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve, DecodeOptions, DecoderKind};
    use crate::error::ErrorKind;
    use crate::ingestion::csv::CsvOptions;
    use crate::ingestion::json::JsonOptions;

    #[test]
    fn resolve_maps_tags_to_decoders() {
        assert_eq!(resolve("csv"), Some(DecoderKind::Delimited));
        assert_eq!(resolve("TSV"), Some(DecoderKind::Delimited));
        assert_eq!(resolve("json"), Some(DecoderKind::Json));
        assert_eq!(resolve("jsonl"), Some(DecoderKind::Json));
        assert_eq!(resolve("xlsx"), Some(DecoderKind::Spreadsheet));
        assert_eq!(resolve("parquet"), Some(DecoderKind::Columnar));
        assert_eq!(resolve("sqlite"), Some(DecoderKind::Relational));
        assert_eq!(resolve("html"), Some(DecoderKind::Html));
    }

    #[test]
    fn resolve_unknown_or_empty_is_none() {
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("weird"), None);
        // `db` is an extension, not a tag
        assert_eq!(resolve("db"), None);
    }

    #[test]
    fn resolve_does_not_touch_the_filesystem() {
        // Resolution succeeds even though no such file exists anywhere.
        assert!(resolve("parquet").is_some());
    }

    #[test]
    fn jsonl_defaults_to_line_mode() {
        match DecodeOptions::defaults_for("jsonl") {
            Some(DecodeOptions::Json(o)) => assert!(o.lines),
            other => panic!("unexpected {other:?}"),
        }
        match DecodeOptions::defaults_for("json") {
            Some(DecodeOptions::Json(o)) => assert!(!o.lines),
            other => panic!("unexpected {other:?}"),
        }
        assert!(DecodeOptions::defaults_for("nope").is_none());
    }

    #[test]
    fn tsv_defaults_to_tab() {
        match DecodeOptions::defaults_for("TSV") {
            Some(DecodeOptions::Csv(o)) => assert_eq!(o.delimiter, Some('\t')),
            other => panic!("unexpected {other:?}"),
        }
        match DecodeOptions::defaults_for("csv") {
            Some(DecodeOptions::Csv(o)) => assert_eq!(o.delimiter, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn limit_override_reaches_every_variant() {
        let opts = DecodeOptions::from(CsvOptions::default()).with_limit(3);
        assert_eq!(opts.limit(), Some(3));
        let opts = DecodeOptions::from(JsonOptions::default().with_limit(9)).with_limit(2);
        assert_eq!(opts.limit(), Some(2));
    }

    #[test]
    fn mismatched_options_are_a_configuration_error() {
        let err = DecoderKind::Columnar
            .read("whatever.parquet", &DecodeOptions::Csv(CsvOptions::default()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
