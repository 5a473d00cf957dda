//! Chart data for one column, plus a minimal self-contained SVG rendering.
//!
//! - [`histogram`]: equal-width bins over the numeric values of a column
//! - [`bar_counts`]: the most frequent values of a column

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::profiling::top_values;
use crate::types::{Record, Value};

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 10;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;

/// Equal-width histogram: `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Top-k value counts, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub column: String,
    pub top_k: usize,
    pub bars: Vec<(String, usize)>,
}

/// Bin the numeric values of `column` into `bins` equal-width bins.
///
/// Numbers are used as-is, strings are used when they parse as a finite number, everything
/// else (and null) is ignored. The bins span `[min, max]`; when every value is the same `v`,
/// they span `[v - 0.5, v + 0.5]`. The last bin is closed on the right.
pub fn histogram(records: &[Record], column: &str, bins: usize) -> InspectResult<Histogram> {
    if bins == 0 {
        return Err(InspectError::configuration("histogram needs at least one bin"));
    }
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get(column).and_then(Option::as_ref))
        .filter_map(numeric_value)
        .collect();
    if values.is_empty() {
        return Err(InspectError::configuration(format!(
            "no numeric data in column '{column}'"
        )));
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for x in &values {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    debug!(column, values = values.len(), bins, "histogram computed");
    Ok(Histogram {
        column: column.to_string(),
        edges,
        counts,
    })
}

fn numeric_value(v: &Value) -> Option<f64> {
    match v {
        Value::Int64(_) | Value::Float64(_) => v.as_f64().filter(|x| x.is_finite()),
        Value::Utf8(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Count the non-null values of `column` and keep the `top_k` most frequent.
///
/// Ties are broken by the value's text, ascending.
pub fn bar_counts(records: &[Record], column: &str, top_k: usize) -> InspectResult<BarChart> {
    if top_k == 0 {
        return Err(InspectError::configuration("bar chart needs top_k >= 1"));
    }
    let values: Vec<&Value> = records
        .iter()
        .filter_map(|r| r.get(column).and_then(Option::as_ref))
        .collect();
    if values.is_empty() {
        return Err(InspectError::configuration(format!(
            "no categorical data in column '{column}'"
        )));
    }
    Ok(BarChart {
        column: column.to_string(),
        top_k,
        bars: top_values(values, top_k),
    })
}

impl Histogram {
    pub fn to_svg(&self) -> String {
        let labels: Vec<String> = self
            .edges
            .windows(2)
            .map(|w| format!("{}-{}", short_number(w[0]), short_number(w[1])))
            .collect();
        render_bars(
            &format!("Histogram of {}", self.column),
            &self.column,
            "Frequency",
            &labels,
            &self.counts,
        )
    }

    pub fn write_svg(&self, path: impl AsRef<Path>) -> InspectResult<()> {
        write_file(path.as_ref(), &self.to_svg())
    }
}

impl BarChart {
    pub fn to_svg(&self) -> String {
        let (labels, counts): (Vec<String>, Vec<usize>) = self.bars.iter().cloned().unzip();
        render_bars(
            &format!("Top {} values of {}", self.top_k, self.column),
            &self.column,
            "Count",
            &labels,
            &counts,
        )
    }

    pub fn write_svg(&self, path: impl AsRef<Path>) -> InspectResult<()> {
        write_file(path.as_ref(), &self.to_svg())
    }
}

fn write_file(path: &Path, svg: &str) -> InspectResult<()> {
    fs::write(path, svg)?;
    debug!(path = %path.display(), bytes = svg.len(), "chart written");
    Ok(())
}

fn render_bars(title: &str, x_label: &str, y_label: &str, labels: &[String], counts: &[usize]) -> String {
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let max = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let slot = plot_w / counts.len().max(1) as f64;

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        MARGIN / 2.0,
        escape(title)
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="black"/>"#,
        bottom = HEIGHT - MARGIN,
        right = WIDTH - MARGIN
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN}" y1="{MARGIN}" x2="{MARGIN}" y2="{bottom}" stroke="black"/>"#,
        bottom = HEIGHT - MARGIN
    );

    for (i, (label, &count)) in labels.iter().zip(counts).enumerate() {
        let h = plot_h * count as f64 / max;
        let x = MARGIN + slot * i as f64;
        let y = HEIGHT - MARGIN - h;
        let _ = writeln!(
            svg,
            r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="#4c72b0"><title>{t}: {count}</title></rect>"##,
            w = slot * 0.9,
            t = escape(label)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="10">{}</text>"#,
            x + slot * 0.45,
            HEIGHT - MARGIN + 14.0,
            escape(label)
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        HEIGHT - 10.0,
        escape(x_label)
    );
    let _ = writeln!(
        svg,
        r#"<text x="15" y="{y}" text-anchor="middle" transform="rotate(-90 15 {y})">{}</text>"#,
        escape(y_label),
        y = HEIGHT / 2.0
    );
    svg.push_str("</svg>\n");
    svg
}

fn short_number(x: f64) -> String {
    let s = format!("{x:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{bar_counts, escape, histogram};
    use crate::error::ErrorKind;
    use crate::types::{Record, Value};

    fn column(values: Vec<Option<Value>>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| [("x".to_string(), v)].into_iter().collect())
            .collect()
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let records = column(vec![
            Some(Value::Int64(0)),
            Some(Value::Float64(5.0)),
            Some(Value::Utf8(" 10 ".to_string())),
            Some(Value::Utf8("n/a".to_string())),
            None,
        ]);
        let h = histogram(&records, "x", 2).unwrap();
        assert_eq!(h.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(h.counts, vec![1, 2]);
    }

    #[test]
    fn histogram_of_one_distinct_value_is_centered() {
        let records = column(vec![Some(Value::Int64(3)), Some(Value::Int64(3))]);
        let h = histogram(&records, "x", 1).unwrap();
        assert_eq!(h.edges, vec![2.5, 3.5]);
        assert_eq!(h.counts, vec![2]);
    }

    #[test]
    fn histogram_without_numbers_is_an_error() {
        let records = column(vec![Some(Value::Utf8("a".to_string())), None]);
        assert_eq!(
            histogram(&records, "x", 10).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            histogram(&records, "missing", 10).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        let records = column(vec![Some(Value::Int64(1))]);
        assert!(histogram(&records, "x", 0).is_err());
    }

    #[test]
    fn bar_counts_uses_top_k_ordering() {
        let records = column(
            ["red", "blue", "red", "green", "blue"]
                .into_iter()
                .map(|s| Some(Value::Utf8(s.to_string())))
                .collect(),
        );
        let bars = bar_counts(&records, "x", 2).unwrap();
        assert_eq!(bars.bars, vec![("blue".to_string(), 2), ("red".to_string(), 2)]);
        assert!(bars.to_svg().contains("Top 2 values of x"));
    }

    #[test]
    fn bar_counts_without_values_is_an_error() {
        let records = column(vec![None, None]);
        assert_eq!(
            bar_counts(&records, "x", 3).unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn svg_is_well_formed_enough() {
        let records = column(vec![Some(Value::Utf8("<b>&".to_string()))]);
        let svg = bar_counts(&records, "x", 1).unwrap().to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("&lt;b&gt;&amp;"));
        assert_eq!(escape("a\"b"), "a&quot;b");
    }
}
