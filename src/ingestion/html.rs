//! HTML-table decoder: one `<table>` of an HTML page or fragment.

use std::path::Path;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::error::{InspectError, InspectResult};
use crate::types::{normalize_column_names, Cell, Table, Value};

use super::source::{self, DEFAULT_ENCODING};

/// Options for [`read_html_from_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Which `<table>` to read, in document order (0-based).
    pub table_index: usize,
    /// Number of `<tr>` rows to skip before the header row.
    pub header_row: usize,
    /// Text encoding label (WHATWG).
    pub encoding: String,
    pub limit: Option<usize>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            table_index: 0,
            header_row: 0,
            encoding: DEFAULT_ENCODING.to_string(),
            limit: None,
        }
    }
}

impl HtmlOptions {
    pub fn with_table_index(mut self, table_index: usize) -> Self {
        self.table_index = table_index;
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> InspectResult<()> {
        source::resolve_encoding(&self.encoding).map(|_| ())
    }
}

/// Read one `<table>` of an HTML file (optionally `.gz`/`.zip` wrapped) into a [`Table`].
pub fn read_html_from_path(path: impl AsRef<Path>, options: &HtmlOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    options.validate()?;
    debug!(path = %path.display(), table_index = options.table_index, "reading html");

    let text = source::read_text(path, &options.encoding)?;
    read_html_from_str(&text, options)
}

/// Read one `<table>` of an HTML document already in memory.
///
/// - every `<tr>` below the table counts as a row, `<th>` and `<td>` both count as cells
/// - cell text is the concatenation of its whitespace-trimmed text fragments
/// - data rows whose cell count differs from the header are skipped
pub fn read_html_from_str(input: &str, options: &HtmlOptions) -> InspectResult<Table> {
    let document = Html::parse_document(input);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let tables: Vec<ElementRef<'_>> = document.select(&table_sel).collect();
    let table = tables.get(options.table_index).ok_or_else(|| {
        InspectError::file_format(format!(
            "no such table: {} (document has {} tables)",
            options.table_index,
            tables.len()
        ))
    })?;

    let mut rows = table.select(&row_sel).skip(options.header_row);
    let header = rows.next().ok_or_else(|| {
        InspectError::file_format(format!(
            "no header row available after skipping {} rows",
            options.header_row
        ))
    })?;
    let columns = normalize_column_names(header.select(&cell_sel).map(cell_text));

    let mut out: Vec<Vec<Cell>> = Vec::new();
    for tr in rows {
        if options.limit.is_some_and(|limit| out.len() >= limit) {
            break;
        }
        let cells: Vec<String> = tr.select(&cell_sel).map(cell_text).collect();
        if cells.len() != columns.len() {
            trace!(cells = cells.len(), expected = columns.len(), "skipping ragged row");
            continue;
        }
        out.push(
            cells
                .into_iter()
                .map(|text| (!text.is_empty()).then_some(Value::Utf8(text)))
                .collect(),
        );
    }

    debug!(rows = out.len(), columns = columns.len(), "html table decoded");
    Table::new(columns, out)
}

fn selector(css: &str) -> InspectResult<Selector> {
    Selector::parse(css)
        .map_err(|e| InspectError::configuration(format!("invalid selector '{css}': {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::{read_html_from_str, HtmlOptions};
    use crate::error::ErrorKind;
    use crate::types::Value;

    const PAGE: &str = r#"
        <html><body>
          <table id="first">
            <tr><th>id</th><th> name </th></tr>
            <tr><td>1</td><td>Ana</td></tr>
          </table>
          <table id="second">
            <tr><td colspan="2">caption row</td></tr>
            <tr><th>city</th><th>pop</th></tr>
            <tr><td>Lima</td><td></td></tr>
            <tr><td>only one cell</td></tr>
            <tr><td>Quito</td><td>2.8M</td></tr>
          </table>
        </body></html>"#;

    #[test]
    fn header_row_skip_and_ragged_rows() {
        let opts = HtmlOptions::default().with_table_index(1).with_header_row(1);
        let t = read_html_from_str(PAGE, &opts).unwrap();
        assert_eq!(t.columns(), &["city".to_string(), "pop".to_string()]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.get(0, "pop"), Some(&None));
        assert_eq!(t.get(1, "pop"), Some(&Some(Value::Utf8("2.8M".to_string()))));
    }

    #[test]
    fn cell_text_is_trimmed() {
        let t = read_html_from_str(PAGE, &HtmlOptions::default()).unwrap();
        assert_eq!(t.columns(), &["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn missing_table_is_a_format_error() {
        let err = read_html_from_str(PAGE, &HtmlOptions::default().with_table_index(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileFormat);
        let err = read_html_from_str("<p>no tables</p>", &HtmlOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileFormat);
    }

    #[test]
    fn skipping_past_every_row_is_a_format_error() {
        let opts = HtmlOptions::default().with_header_row(10);
        let err = read_html_from_str(PAGE, &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileFormat);
    }

    #[test]
    fn limit_counts_kept_rows() {
        let opts = HtmlOptions::default()
            .with_table_index(1)
            .with_header_row(1)
            .with_limit(1);
        let t = read_html_from_str(PAGE, &opts).unwrap();
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.get(0, "city"), Some(&Some(Value::Utf8("Lima".to_string()))));
    }
}
