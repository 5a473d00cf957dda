use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tabinspect::ingestion::json::{read_json_from_path, JsonOptions};
use tabinspect::types::Value;
use tabinspect::ErrorKind;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabinspect-json-{nanos}.{ext}"))
}

#[test]
fn json_records_discover_columns_in_first_seen_order() {
    let t = read_json_from_path("tests/fixtures/people.json", &JsonOptions::default()).unwrap();
    assert_eq!(t.columns(), &["id", "name", "age", "city", "tags"]);
    assert_eq!(t.row_count(), 4);
    assert_eq!(t.get(0, "id"), Some(&Some(Value::Int64(1))));
    assert_eq!(t.get(1, "name"), Some(&None));
    // keys missing from a record are nulls
    assert_eq!(t.get(0, "tags"), Some(&None));
    // nested values are kept as compact JSON text
    assert_eq!(
        t.get(3, "tags"),
        Some(&Some(Value::Utf8(r#"["a","b"]"#.to_string())))
    );
}

#[test]
fn jsonl_skips_blank_lines_and_keeps_number_kinds() {
    let t = read_json_from_path("tests/fixtures/events.jsonl", &JsonOptions::default()).unwrap();
    assert_eq!(t.columns(), &["event", "user", "ms", "ok"]);
    assert_eq!(t.row_count(), 3);
    assert_eq!(t.get(0, "ms"), Some(&Some(Value::Int64(120))));
    assert_eq!(t.get(1, "ms"), Some(&Some(Value::Float64(35.5))));
    assert_eq!(t.get(2, "ok"), Some(&Some(Value::Bool(true))));
}

#[test]
fn lines_flag_forces_line_mode_on_json_extension() {
    let path = tmp_file("json");
    std::fs::write(&path, "{\"a\": 1}\n{\"a\": 2}\n").unwrap();
    assert_eq!(
        read_json_from_path(&path, &JsonOptions::default())
            .unwrap_err()
            .kind(),
        ErrorKind::FileFormat
    );
    let t = read_json_from_path(&path, &JsonOptions::default().with_lines(true)).unwrap();
    assert_eq!(t.row_count(), 2);
    let _ = std::fs::remove_file(path);
}

#[test]
fn jsonl_error_names_the_line() {
    let path = tmp_file("jsonl");
    std::fs::write(&path, "{\"a\": 1}\n\n{oops}\n").unwrap();
    let err = read_json_from_path(&path, &JsonOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileFormat);
    assert!(err.to_string().contains("line 3"), "{err}");

    std::fs::write(&path, "{\"a\": 1}\n[1, 2]\n").unwrap();
    let err = read_json_from_path(&path, &JsonOptions::default()).unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
    let _ = std::fs::remove_file(path);
}

#[test]
fn records_json_must_be_an_array_of_objects() {
    let path = tmp_file("json");
    std::fs::write(&path, r#"{"a": 1}"#).unwrap();
    assert_eq!(
        read_json_from_path(&path, &JsonOptions::default())
            .unwrap_err()
            .kind(),
        ErrorKind::FileFormat
    );
    std::fs::write(&path, r#"[{"a": 1}, 2]"#).unwrap();
    assert_eq!(
        read_json_from_path(&path, &JsonOptions::default())
            .unwrap_err()
            .kind(),
        ErrorKind::FileFormat
    );
    let _ = std::fs::remove_file(path);
}

#[test]
fn limit_truncates_both_modes() {
    let t = read_json_from_path("tests/fixtures/people.json", &JsonOptions::default().with_limit(2))
        .unwrap();
    assert_eq!(t.row_count(), 2);
    let t = read_json_from_path("tests/fixtures/events.jsonl", &JsonOptions::default().with_limit(1))
        .unwrap();
    assert_eq!(t.row_count(), 1);
    assert_eq!(t.columns(), &["event", "user", "ms"]);
}

#[test]
fn empty_array_is_an_empty_table() {
    let path = tmp_file("json");
    std::fs::write(&path, "[]").unwrap();
    let t = read_json_from_path(&path, &JsonOptions::default()).unwrap();
    assert_eq!(t.shape(), (0, 0));
    let _ = std::fs::remove_file(path);
}
