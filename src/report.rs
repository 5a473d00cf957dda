//! Markdown rendering of a profile, a validation report and any charts produced alongside them.

use std::fmt::{self, Write as _};

use crate::profiling::ProfileReport;
use crate::validation::ValidationReport;

/// A chart already written to disk, referenced from the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLink<'a> {
    pub column: &'a str,
    pub path: &'a str,
}

/// Everything [`render_markdown`] needs.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    /// Shown in the title, usually the input path.
    pub source: &'a str,
    pub profile: &'a ProfileReport,
    pub validation: &'a ValidationReport,
    pub histogram: Option<ChartLink<'a>>,
    pub bar_chart: Option<ChartLink<'a>>,
}

/// Render the report as Markdown.
///
/// Sections, in order: title, `Overview`, `Numeric columns`, `Categorical columns`,
/// `Validation issues`, `Charts`. Empty column/issue sections hold a single `- None` bullet.
pub fn render_markdown(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, input);
    out
}

fn write_report(out: &mut String, input: &ReportInput<'_>) -> fmt::Result {
    let profile = input.profile;
    writeln!(out, "# Report for {}\n", input.source)?;

    writeln!(out, "## Overview")?;
    writeln!(out, "- Rows: {}", profile.rows)?;
    writeln!(out, "- Columns: {}\n", profile.columns)?;

    writeln!(out, "## Numeric columns")?;
    if profile.numeric.is_empty() {
        writeln!(out, "- None")?;
    }
    for ns in &profile.numeric {
        writeln!(
            out,
            "- {}: count={}, nulls={}, distinct={}, min={}, max={}, mean={}",
            ns.column,
            ns.count,
            ns.nulls,
            ns.distinct,
            OptDisplay(ns.min.as_ref()),
            OptDisplay(ns.max.as_ref()),
            OptDisplay(ns.mean.as_ref()),
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Categorical columns")?;
    if profile.categorical.is_empty() {
        writeln!(out, "- None")?;
    }
    for cs in &profile.categorical {
        let top = cs
            .top
            .iter()
            .map(|(v, n)| format!("{v} ({n})"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            out,
            "- {}: count={}, nulls={}, distinct={}, top=[{}]",
            cs.column, cs.count, cs.nulls, cs.distinct, top
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Validation issues")?;
    if input.validation.issues.is_empty() {
        writeln!(out, "- None")?;
    }
    for issue in &input.validation.issues {
        writeln!(
            out,
            "- code={}, column={}, count={}, examples={:?}",
            issue.code, issue.column, issue.count, issue.examples
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Charts")?;
    if let Some(h) = input.histogram {
        writeln!(out, "- Histogram for `{}`: ![]({})", h.column, h.path)?;
    }
    if let Some(b) = input.bar_chart {
        writeln!(out, "- Bar chart for `{}`: ![]({})", b.column, b.path)?;
    }
    Ok(())
}

struct OptDisplay<'a, T>(Option<&'a T>);

impl<T: fmt::Display> fmt::Display for OptDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_markdown, ChartLink, ReportInput};
    use crate::profiling::summarize;
    use crate::types::{Record, Value};
    use crate::validation::{validate, Schema};

    fn records() -> Vec<Record> {
        vec![
            [
                ("n".to_string(), Some(Value::Int64(1))),
                ("name".to_string(), Some(Value::Utf8("a".to_string()))),
            ]
            .into_iter()
            .collect(),
            [
                ("n".to_string(), Some(Value::Int64(3))),
                ("name".to_string(), None),
            ]
            .into_iter()
            .collect(),
        ]
    }

    #[test]
    fn report_has_every_section_in_order() {
        let recs = records();
        let profile = summarize(&recs, 3);
        let validation = validate(&recs, &Schema::default());
        let md = render_markdown(&ReportInput {
            source: "data.csv",
            profile: &profile,
            validation: &validation,
            histogram: Some(ChartLink {
                column: "n",
                path: "hist.svg",
            }),
            bar_chart: None,
        });

        let headings: Vec<&str> = md.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(
            headings,
            vec![
                "# Report for data.csv",
                "## Overview",
                "## Numeric columns",
                "## Categorical columns",
                "## Validation issues",
                "## Charts",
            ]
        );
        assert!(md.contains("- Rows: 2\n- Columns: 2\n"));
        assert!(md.contains("- n: count=2, nulls=0, distinct=2, min=1, max=3, mean=2"));
        assert!(md.contains("- name: count=1, nulls=1, distinct=1, top=[a (1)]"));
        assert!(md.contains("## Validation issues\n- None\n"));
        assert!(md.contains("- Histogram for `n`: ![](hist.svg)"));
        assert!(!md.contains("Bar chart for"));
    }

    #[test]
    fn issues_are_listed() {
        let recs = records();
        let schema = Schema::from_json_str(r#"{"name": {"required": true}}"#).unwrap();
        let profile = summarize(&recs, 3);
        let validation = validate(&recs, &schema);
        let md = render_markdown(&ReportInput {
            source: "data.csv",
            profile: &profile,
            validation: &validation,
            histogram: None,
            bar_chart: Some(ChartLink {
                column: "name",
                path: "bar.svg",
            }),
        });
        assert!(md.contains("- code=missing_required, column=name, count=1, examples=[1]"));
        assert!(md.contains("- Bar chart for `name`: ![](bar.svg)"));
    }

    #[test]
    fn empty_profile_says_none() {
        let profile = summarize(&[], 3);
        let validation = validate(&[], &Schema::default());
        let md = render_markdown(&ReportInput {
            source: "empty.json",
            profile: &profile,
            validation: &validation,
            histogram: None,
            bar_chart: None,
        });
        assert!(md.contains("## Numeric columns\n- None\n"));
        assert!(md.contains("## Categorical columns\n- None\n"));
        assert!(md.trim_end().ends_with("## Charts"));
    }
}
