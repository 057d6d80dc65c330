//! Pipeline performance benchmarks.
//!
//! Measures parsing, profiling and aggregation across table sizes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rollup::inference::TypeInference;
use rollup::input::Parser;
use rollup::{DerivationMode, PipelineConfig, Reduction, run_pipeline};

/// Generate synthetic sales data with a timestamp, a category and two metrics.
fn generate_csv_data(rows: usize) -> String {
    let mut data = String::from("timestamp,region,amount,quantity\n");
    for row in 0..rows {
        let day = (row % 28) + 1;
        let hour = row % 24;
        let minute = (row * 7) % 60;
        data.push_str(&format!(
            "2024-03-{day:02}T{hour:02}:{minute:02}:00,region_{},{:.2},{}\n",
            row % 8,
            row as f64 * 1.5,
            row % 13
        ));
    }
    data
}

/// Benchmark parsing CSV bytes of various sizes.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_csv_data(*rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            let parser = Parser::new();
            b.iter(|| black_box(parser.parse_bytes(data.as_bytes()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark column profiling, which parses every cell twice.
fn bench_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile_table");

    for rows in [100, 1_000, 10_000].iter() {
        let table = Parser::new()
            .parse_str(&generate_csv_data(*rows))
            .unwrap();
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            let inference = TypeInference::new();
            b.iter(|| black_box(inference.profile_table(table)))
        });
    }

    group.finish();
}

/// Benchmark aggregation under each derivation mode.
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let table = Parser::new()
        .parse_str(&generate_csv_data(10_000))
        .unwrap();

    for mode in [
        DerivationMode::Hour,
        DerivationMode::Date,
        DerivationMode::Weekday,
        DerivationMode::Month,
    ] {
        let config = PipelineConfig::new("timestamp")
            .derive(mode)
            .metrics(["amount", "quantity"])
            .reduce(Reduction::Median);
        group.bench_with_input(BenchmarkId::new("derive", mode), &config, |b, config| {
            b.iter(|| black_box(run_pipeline(&table, config).unwrap()))
        });
    }

    let by_region = PipelineConfig::new("region").metric("amount");
    group.bench_function("categorical", |b| {
        b.iter(|| black_box(run_pipeline(&table, &by_region).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_profile, bench_aggregate);
criterion_main!(benches);
