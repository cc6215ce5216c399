//! Benchmarks for check query compilation and a full batched run.

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use warehouse_guard::expectation::{Expectation, ExpectationKind};
use warehouse_guard::prelude::*;
use warehouse_guard::sql::QueryRenderer;

/// `n` distinct expectations over columns `col_0 .. col_n`.
fn expectations(n: usize) -> Vec<Expectation> {
    (0..n)
        .map(|i| {
            let column = format!("col_{i}");
            let kind = match i % 4 {
                0 => ExpectationKind::NotNull { column },
                1 => ExpectationKind::ValuesUnique { column },
                2 => ExpectationKind::MeanBetween {
                    column,
                    low: 0.into(),
                    high: 100.into(),
                },
                _ => ExpectationKind::MatchesRegex {
                    column,
                    pattern: r"^user\d+@example\.com$".to_string(),
                },
            };
            Expectation::new(kind).unwrap()
        })
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_check_query");
    let table = TableRef::new("acme", "analytics", "events");

    for n in [1, 10, 100, 1000] {
        let expectations = expectations(n);
        for dialect in [Dialect::BigQuery, Dialect::DataFusion] {
            let renderer = QueryRenderer::new(dialect);
            group.bench_with_input(
                BenchmarkId::new(dialect.to_string(), n),
                &expectations,
                |b, expectations| {
                    b.iter(|| {
                        std::hint::black_box(
                            renderer.render_check_query(&table, expectations).unwrap(),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

fn create_users(rows: usize) -> DataFusionWarehouse {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("email", DataType::Utf8, true),
        Field::new("age", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from((0..rows as i64).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                (0..rows)
                    .map(|i| Some(format!("user{i}@example.com")))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                (0..rows).map(|i| (18 + i % 60) as f64).collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap();

    let warehouse = DataFusionWarehouse::new();
    warehouse.register_batches("users", vec![batch]).unwrap();
    warehouse
}

fn bench_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let warehouse = Arc::new(create_users(10_000));
    let table = warehouse.table_ref("users");

    let mut checks = runtime
        .block_on(CheckBuilder::new(warehouse, table))
        .unwrap();
    checks
        .expect_column_value_to_not_be_null("id")
        .unwrap()
        .expect_column_values_to_be_unique("id")
        .unwrap()
        .expect_column_value_mean_to_be_between("age", 18, 80)
        .unwrap()
        .expect_column_values_to_match_regex("email", "^user[0-9]+@example[.]com$")
        .unwrap()
        .expect_table_row_count_to_be_between(1, 1_000_000)
        .unwrap();

    c.bench_function("run_five_checks_10k_rows", |b| {
        b.iter(|| std::hint::black_box(runtime.block_on(checks.run()).unwrap()))
    });
}

criterion_group!(benches, bench_compile, bench_run);
criterion_main!(benches);
