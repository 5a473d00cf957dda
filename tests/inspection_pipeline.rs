use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tabinspect::chart::{bar_counts, histogram};
use tabinspect::ingestion::{read_from_path, CsvOptions, ReadOptions};
use tabinspect::profiling::summarize;
use tabinspect::report::{render_markdown, ChartLink, ReportInput};
use tabinspect::types::Value;
use tabinspect::validation::{validate, IssueCode, Schema};

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabinspect-pipeline-{nanos}.{ext}"))
}

#[test]
fn profile_of_json_people() {
    let t = read_from_path("tests/fixtures/people.json", &ReadOptions::default()).unwrap();
    let report = summarize(&t.records(), 2);

    assert_eq!((report.rows, report.columns), (4, 5));
    let numeric: Vec<&str> = report.numeric.iter().map(|n| n.column.as_str()).collect();
    assert_eq!(numeric, vec!["age", "id"]);

    let age = &report.numeric[0];
    assert_eq!((age.count, age.nulls, age.distinct), (3, 1, 3));
    assert_eq!(age.min, Some(Value::Int64(28)));
    assert_eq!(age.max, Some(Value::Int64(41)));

    let city = report
        .categorical
        .iter()
        .find(|c| c.column == "city")
        .unwrap();
    assert_eq!(city.top, vec![("Lisbon".to_string(), 2), ("Faro".to_string(), 1)]);
}

#[test]
fn csv_without_inference_profiles_as_categorical() {
    let t = read_from_path("tests/fixtures/people.csv", &ReadOptions::default()).unwrap();
    let report = t.profile(3);
    assert!(report.numeric.is_empty());

    let opts = ReadOptions::default().with_decode(CsvOptions::default().with_infer_types(true));
    let t = read_from_path("tests/fixtures/people.csv", &opts).unwrap();
    assert_eq!(t.profile(3).numeric.len(), 2);
}

#[test]
fn validation_of_json_people_against_schema_file() {
    let t = read_from_path("tests/fixtures/people.json", &ReadOptions::default()).unwrap();
    let schema = Schema::from_path("tests/fixtures/people_schema.json").unwrap();
    let report = validate(&t.records(), &schema);

    assert_eq!(report.row_count, 4);
    assert_eq!(report.column_count, 5);
    let found: Vec<(IssueCode, &str, usize, Vec<usize>)> = report
        .issues
        .iter()
        .map(|i| (i.code, i.column.as_str(), i.count, i.examples.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            (IssueCode::MissingRequired, "name", 1, vec![1]),
            (IssueCode::OutOfRange, "age", 1, vec![3]),
            (IssueCode::NotAllowed, "city", 1, vec![3]),
        ]
    );
    assert!(!report.is_valid());
}

#[test]
fn charts_and_report_end_to_end() {
    let opts = ReadOptions::default().with_decode(CsvOptions::default().with_infer_types(true));
    let t = read_from_path("tests/fixtures/people.csv", &opts).unwrap();
    let records = t.records();

    let hist = histogram(&records, "age", 2).unwrap();
    assert_eq!(hist.counts.iter().sum::<usize>(), 3);
    let bars = bar_counts(&records, "city", 1).unwrap();
    assert_eq!(bars.bars, vec![("Lisbon".to_string(), 2)]);

    let hist_path = tmp_file("hist.svg");
    let bar_path = tmp_file("bar.svg");
    hist.write_svg(&hist_path).unwrap();
    bars.write_svg(&bar_path).unwrap();
    assert!(std::fs::read_to_string(&hist_path).unwrap().contains("Histogram of age"));
    assert!(std::fs::read_to_string(&bar_path).unwrap().contains("Top 1 values of city"));

    let profile = summarize(&records, 3);
    let validation = validate(&records, &Schema::default());
    let hist_str = hist_path.display().to_string();
    let bar_str = bar_path.display().to_string();
    let md = render_markdown(&ReportInput {
        source: "tests/fixtures/people.csv",
        profile: &profile,
        validation: &validation,
        histogram: Some(ChartLink {
            column: "age",
            path: &hist_str,
        }),
        bar_chart: Some(ChartLink {
            column: "city",
            path: &bar_str,
        }),
    });
    assert!(md.starts_with("# Report for tests/fixtures/people.csv\n"));
    assert!(md.contains("## Validation issues\n- None\n"));
    assert!(md.contains(&format!("- Histogram for `age`: ![]({hist_str})")));
    assert!(md.contains(&format!("- Bar chart for `city`: ![]({bar_str})")));

    let _ = std::fs::remove_file(hist_path);
    let _ = std::fs::remove_file(bar_path);
}
