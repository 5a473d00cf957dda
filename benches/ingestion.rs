//! Benchmarks for the text decoders.
//!
//! Run with: cargo bench --bench ingestion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tabinspect::ingestion::csv::{read_csv_from_str, CsvOptions};
use tabinspect::ingestion::json::read_jsonl_from_str;

fn synthetic_csv(rows: usize) -> String {
    let mut out = String::from("id,name,score,active\n");
    for i in 0..rows {
        out.push_str(&format!("{i},user_{},{}.5,{}\n", i % 97, i % 1000, i % 2 == 0));
    }
    out
}

fn synthetic_jsonl(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("{{\"id\": {i}, \"name\": \"user_{}\", \"score\": {}.5}}\n", i % 97, i % 1000))
        .collect()
}

fn bench_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv");
    for rows in [1_000, 10_000, 100_000] {
        let input = synthetic_csv(rows);
        group.bench_with_input(BenchmarkId::new("strings", rows), &input, |b, input| {
            let opts = CsvOptions::default();
            b.iter(|| read_csv_from_str(black_box(input), ',', &opts).map(|t| t.row_count()))
        });
        group.bench_with_input(BenchmarkId::new("infer_types", rows), &input, |b, input| {
            let opts = CsvOptions::default().with_infer_types(true);
            b.iter(|| read_csv_from_str(black_box(input), ',', &opts).map(|t| t.row_count()))
        });
    }
    group.finish();
}

fn bench_jsonl(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsonl");
    for rows in [1_000, 10_000, 100_000] {
        let input = synthetic_jsonl(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, input| {
            b.iter(|| read_jsonl_from_str(black_box(input), None).map(|t| t.row_count()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_csv, bench_jsonl);
criterion_main!(benches);
