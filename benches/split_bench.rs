//! Benchmarks for splitting and loading.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::explicit_iter_loop,
    missing_docs
)]

use std::{fmt::Write as _, fs, path::Path};

use agency_dataset::{load_data_set, DataConfig, DatasetSplitter, LoadMode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn write_csv(path: &Path, rows: usize) {
    let mut content = String::from("full_text,advertiser_type,posting_id\n");
    for i in 0..rows {
        let label = if i % 5 == 0 { "yes" } else { "no" };
        writeln!(content, "\"Vacancy {i}, full description text\",{label},{i}")
            .expect("Failed to format row");
    }
    fs::write(path, content).expect("Failed to write csv");
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_csv");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let splitter = DatasetSplitter::default();

    for size in [1_000, 10_000, 100_000].iter() {
        let source = dir.path().join(format!("data_{size}.csv"));
        write_csv(&source, *size);
        let dest = dir.path().join(format!("out_{size}"));

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| splitter.split(black_box(&source), &dest).expect("split failed"));
        });
    }

    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let splitter = DatasetSplitter::default();
    c.bench_function("partition_1m", |b| {
        b.iter(|| splitter.partition(black_box(1_000_000)));
    });
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_csv");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = DataConfig::from_json_str(
        r#"{"csv_fields": {
            "features": "full_text",
            "class": "advertiser_type",
            "doc_id": "posting_id"
        }}"#,
    )
    .expect("Failed to parse config");

    for size in [1_000, 10_000].iter() {
        let source = dir.path().join(format!("data_{size}.csv"));
        write_csv(&source, *size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                load_data_set(&config, black_box(&source), LoadMode::Detail)
                    .expect("Failed to open")
                    .count()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_partition, bench_load);
criterion_main!(benches);
