use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use tabinspect::ingestion::parquet::{read_parquet_from_path, ParquetOptions};
use tabinspect::types::Value;
use tabinspect::ErrorKind;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabinspect-parquet-{nanos}.{ext}"))
}

/// Three rows: `(1, "Ada", 98.5, true)`, `(2, null, 87.25, false)`, `(3, "Linus", 70.0, true)`.
fn write_people_parquet(path: &PathBuf) {
    let schema_str = r#"
    message schema {
      REQUIRED INT64 id;
      OPTIONAL BINARY name (UTF8);
      REQUIRED DOUBLE score;
      REQUIRED BOOLEAN active;
    }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let mut rg = writer.next_row_group().unwrap();
    while let Some(mut col) = rg.next_column().unwrap() {
        match col.untyped() {
            ColumnWriter::Int64ColumnWriter(w) => {
                w.write_batch(&[1_i64, 2, 3], None, None).unwrap();
            }
            ColumnWriter::ByteArrayColumnWriter(w) => {
                let values = [ByteArray::from("Ada"), ByteArray::from("Linus")];
                w.write_batch(&values, Some(&[1, 0, 1]), None).unwrap();
            }
            ColumnWriter::DoubleColumnWriter(w) => {
                w.write_batch(&[98.5_f64, 87.25, 70.0], None, None).unwrap();
            }
            ColumnWriter::BoolColumnWriter(w) => {
                w.write_batch(&[true, false, true], None, None).unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
    }
    rg.close().unwrap();
    writer.close().unwrap();
}

#[test]
fn parquet_reads_all_columns_in_schema_order() {
    let path = tmp_file("parquet");
    write_people_parquet(&path);

    let t = read_parquet_from_path(&path, &ParquetOptions::default()).unwrap();
    assert_eq!(t.columns(), &["id", "name", "score", "active"]);
    assert_eq!(t.shape(), (3, 4));
    assert_eq!(t.get(0, "id"), Some(&Some(Value::Int64(1))));
    assert_eq!(t.get(0, "name"), Some(&Some(Value::Utf8("Ada".to_string()))));
    assert_eq!(t.get(1, "name"), Some(&None));
    assert_eq!(t.get(1, "score"), Some(&Some(Value::Float64(87.25))));
    assert_eq!(t.get(2, "active"), Some(&Some(Value::Bool(true))));

    let _ = std::fs::remove_file(path);
}

#[test]
fn parquet_column_subset_keeps_requested_order() {
    let path = tmp_file("parquet");
    write_people_parquet(&path);

    let opts = ParquetOptions::default().with_columns(["score", "id"]);
    let t = read_parquet_from_path(&path, &opts).unwrap();
    assert_eq!(t.columns(), &["score", "id"]);
    assert_eq!(t.get(2, "id"), Some(&Some(Value::Int64(3))));

    let _ = std::fs::remove_file(path);
}

#[test]
fn parquet_unknown_column_is_configuration_error() {
    let path = tmp_file("parquet");
    write_people_parquet(&path);

    let opts = ParquetOptions::default().with_columns(["nope"]);
    let err = read_parquet_from_path(&path, &opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("nope"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn parquet_limit() {
    let path = tmp_file("parquet");
    write_people_parquet(&path);

    let t = read_parquet_from_path(&path, &ParquetOptions::default().with_limit(2)).unwrap();
    assert_eq!(t.row_count(), 2);
    let t = read_parquet_from_path(&path, &ParquetOptions::default().with_limit(0)).unwrap();
    assert_eq!(t.shape(), (0, 4));

    let _ = std::fs::remove_file(path);
}

#[test]
fn non_parquet_bytes_are_a_format_error() {
    let path = tmp_file("parquet");
    std::fs::write(&path, b"definitely not parquet").unwrap();
    let err = read_parquet_from_path(&path, &ParquetOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileFormat);
    let _ = std::fs::remove_file(path);
}
