//! End-to-end tests for CheckBuilder against an in-process DataFusion warehouse.

mod common;

use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use common::{numbers_batch, users_table, users_warehouse, CountingWarehouse};
use std::sync::Arc;
use warehouse_guard::prelude::*;

async fn users_builder() -> (Arc<CountingWarehouse<DataFusionWarehouse>>, CheckBuilder) {
    let warehouse = users_warehouse();
    let builder = CheckBuilder::new(warehouse.clone(), users_table())
        .await
        .unwrap();
    (warehouse, builder)
}

async fn numbers_builder(rows: i64) -> CheckBuilder {
    let warehouse = DataFusionWarehouse::new();
    warehouse
        .register_batches("numbers", vec![numbers_batch(rows)])
        .unwrap();
    let table = warehouse.table_ref("numbers");
    CheckBuilder::new(Arc::new(warehouse), table).await.unwrap()
}

fn result_of(report: &CheckReport, check_name: &str) -> bool {
    report
        .get(check_name)
        .unwrap_or_else(|| panic!("no row for {check_name}"))
        .result
}

#[tokio::test]
async fn test_single_query_for_all_expectations() {
    let (warehouse, mut checks) = users_builder().await;
    assert_eq!(warehouse.schema_queries(), 1);

    checks
        .expect_column_value_to_not_be_null("id")
        .unwrap()
        .expect_column_value_to_not_be_null("score")
        .unwrap()
        .expect_column_value_mean_to_be_between("age", 10, 20)
        .unwrap()
        .expect_column_values_to_be_unique("id")
        .unwrap()
        .expect_column_values_to_match_regex("email", r"^[^@]+@")
        .unwrap()
        .expect_column_values_to_not_match_regex("email", "^[0-9]+$")
        .unwrap()
        .expect_table_row_count_to_be_between(1, 10)
        .unwrap();

    // Registration never touches the warehouse.
    assert!(warehouse.queries().is_empty());

    let report = checks.run().await.unwrap();
    assert_eq!(warehouse.queries().len(), 1);
    assert_eq!(warehouse.schema_queries(), 1);

    let names: Vec<_> = report.rows().iter().map(|r| r.check_name.as_str()).collect();
    let registered: Vec<_> = checks.expectations().iter().map(|e| e.check_name()).collect();
    assert_eq!(names, registered);
    assert_eq!(report.len(), 7);

    let summary = report.summary();
    assert_eq!(summary.failed, 1);
    assert!(!result_of(&report, "expect_score_value_to_not_be_null"));
    assert_eq!(
        report.get("expect_score_value_to_not_be_null").unwrap().pass_fail,
        "🔴"
    );
    assert_eq!(
        report.get("expect_id_value_to_not_be_null").unwrap().pass_fail,
        "🟢"
    );
    assert_eq!(checks.state(), BuilderState::Executed);
}

#[tokio::test]
async fn test_not_null() {
    let (_, mut checks) = users_builder().await;
    checks
        .expect_column_value_to_not_be_null("id")
        .unwrap()
        .expect_column_value_to_not_be_null("score")
        .unwrap();

    let report = checks.run().await.unwrap();
    assert!(result_of(&report, "expect_id_value_to_not_be_null"));
    assert!(!result_of(&report, "expect_score_value_to_not_be_null"));
}

#[tokio::test]
async fn test_mean_between_bounds_are_inclusive() {
    // Mean age is exactly 15.
    let cases = [(10, 20, true), (15, 20, true), (10, 15, true), (16, 20, false), (1, 14, false)];

    for (low, high, expected) in cases {
        let (_, mut checks) = users_builder().await;
        checks
            .expect_column_value_mean_to_be_between("age", low, high)
            .unwrap();
        let report = checks.run().await.unwrap();
        assert_eq!(
            result_of(&report, "expect_age_value_mean_to_be_between"),
            expected,
            "mean 15 in [{low}, {high}]"
        );
    }
}

#[tokio::test]
async fn test_mean_between_float_bounds() {
    // Mean score over non-null values is 2.5.
    let (_, mut checks) = users_builder().await;
    checks
        .expect_column_value_mean_to_be_between("score", 2.5, "2.5")
        .unwrap();
    let report = checks.run().await.unwrap();
    assert!(report.all_passed());
}

#[tokio::test]
async fn test_values_unique() {
    let (_, mut checks) = users_builder().await;
    checks
        .expect_column_values_to_be_unique("id")
        .unwrap()
        .expect_column_values_to_be_unique("age")
        .unwrap();

    let report = checks.run().await.unwrap();
    assert!(result_of(&report, "expect_id_column_values_to_be_unique"));
    assert!(!result_of(&report, "expect_age_column_values_to_be_unique"));
}

#[tokio::test]
async fn test_row_count_between() {
    for (rows, expected) in [(5, true), (4, false), (6, false)] {
        let mut checks = numbers_builder(rows).await;
        checks.expect_table_row_count_to_be_between(5, 5).unwrap();
        let report = checks.run().await.unwrap();
        assert_eq!(
            result_of(&report, "expect_table_row_count_to_be_between"),
            expected,
            "{rows} rows"
        );
    }
}

#[tokio::test]
async fn test_regex_expectations() {
    let (_, mut checks) = users_builder().await;
    checks
        .expect_column_values_to_match_regex("email", "@acme[.]com$")
        .unwrap()
        .expect_column_values_to_match_regex("email", r"^[a-z]+@")
        .unwrap()
        .expect_column_values_to_not_match_regex("email", "@other[.]org$")
        .unwrap()
        .expect_column_values_to_not_match_regex("email", "o'brien")
        .unwrap()
        .expect_column_values_to_match_regex("id", "^[0-9]$")
        .unwrap();

    let report = checks.run().await.unwrap();
    let results: Vec<bool> = report.rows().iter().map(|r| r.result).collect();
    assert_eq!(results, vec![false, true, false, true, true]);
    assert_eq!(
        report.rows()[0].check_name,
        "expect_column_email_values_to_match_regex_acme[.]com"
    );
}

#[tokio::test]
async fn test_unknown_column_fails_without_mutation() {
    let (warehouse, mut checks) = users_builder().await;
    checks.expect_column_value_to_not_be_null("id").unwrap();

    let err = checks
        .expect_column_values_to_be_unique("does_not_exist")
        .unwrap_err();
    assert!(matches!(err, GuardError::UnknownColumn { ref column, .. } if column == "does_not_exist"));

    // Lookups are case-sensitive.
    let err = checks.expect_column_value_to_not_be_null("Id").unwrap_err();
    assert!(matches!(err, GuardError::UnknownColumn { .. }));

    assert_eq!(checks.len(), 1);
    assert!(warehouse.queries().is_empty());
}

#[tokio::test]
async fn test_run_without_expectations() {
    let (warehouse, mut checks) = users_builder().await;
    let err = checks.run().await.unwrap_err();
    assert!(matches!(err, GuardError::NoExpectationsRegistered { .. }));
    assert!(warehouse.queries().is_empty());
    assert_eq!(checks.state(), BuilderState::Empty);
}

#[tokio::test]
async fn test_run_is_idempotent() {
    let (warehouse, mut checks) = users_builder().await;
    checks
        .expect_column_value_to_not_be_null("score")
        .unwrap()
        .expect_table_row_count_to_be_between(4, 4)
        .unwrap();

    let first = checks.run().await.unwrap();
    let second = checks.run().await.unwrap();

    let queries = warehouse.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], queries[1]);
    assert_eq!(first.sql(), second.sql());

    let outcome = |r: &CheckReport| -> Vec<(String, bool)> {
        r.rows()
            .iter()
            .map(|row| (row.check_name.clone(), row.result))
            .collect()
    };
    assert_eq!(outcome(&first), outcome(&second));
    assert_eq!(checks.runs(), 2);
}

#[tokio::test]
async fn test_expectations_after_run() {
    let (warehouse, mut checks) = users_builder().await;
    checks.expect_column_value_to_not_be_null("id").unwrap();
    checks.run().await.unwrap();

    checks.expect_column_values_to_be_unique("id").unwrap();
    assert_eq!(checks.state(), BuilderState::Accumulating);

    let report = checks.run().await.unwrap();
    assert_eq!(report.len(), 2);
    assert_ne!(warehouse.queries()[0], warehouse.queries()[1]);
}

#[tokio::test]
async fn test_duplicate_check_name() {
    let (_, mut checks) = users_builder().await;
    checks.expect_column_value_to_not_be_null("id").unwrap();
    let err = checks.expect_column_value_to_not_be_null("id").unwrap_err();
    assert!(matches!(err, GuardError::DuplicateCheckName { ref check_name } if check_name == "expect_id_value_to_not_be_null"));
    assert_eq!(checks.len(), 1);
}

#[tokio::test]
async fn test_missing_table_is_schema_unavailable() {
    let warehouse = users_warehouse();
    let err = CheckBuilder::new(warehouse, TableRef::new("datafusion", "public", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, GuardError::SchemaUnavailable { ref table, .. } if table == "datafusion.public.nope"));
}

#[tokio::test]
async fn test_warehouse_error_is_propagated() {
    let (warehouse, mut checks) = users_builder().await;
    checks.expect_column_value_to_not_be_null("id").unwrap();

    // The table disappears between schema fetch and run.
    warehouse
        .inner()
        .context()
        .deregister_table("users")
        .unwrap();

    let err = checks.run().await.unwrap_err();
    match err {
        GuardError::WarehouseQueryFailed { message, .. } => assert!(message.contains("users")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(warehouse.queries().len(), 1);
}

#[tokio::test]
async fn test_empty_table() {
    let mut checks = numbers_builder(0).await;
    checks
        .expect_column_value_to_not_be_null("n")
        .unwrap()
        .expect_column_values_to_be_unique("n")
        .unwrap()
        .expect_column_value_mean_to_be_between("n", 0, 10)
        .unwrap()
        .expect_table_row_count_to_be_between(0, 0)
        .unwrap();

    let report = checks.run().await.unwrap();
    let results: Vec<bool> = report.rows().iter().map(|r| r.result).collect();
    // The mean of no values is NULL, which fails the range check.
    assert_eq!(results, vec![true, true, false, true]);
}

#[tokio::test]
async fn test_regex_ignores_nulls() {
    let (_, mut checks) = users_builder().await;
    checks
        .expect_column_values_to_match_regex("score", "^[0-9][.]5$")
        .unwrap()
        .expect_column_values_to_not_match_regex("score", "^9")
        .unwrap()
        .expect_column_values_to_match_regex("score", "^1")
        .unwrap()
        .expect_column_values_to_not_match_regex("score", "[.]5$")
        .unwrap();

    let report = checks.run().await.unwrap();
    let results: Vec<bool> = report.rows().iter().map(|r| r.result).collect();
    // The NULL score neither fails a match nor counts as a forbidden match.
    assert_eq!(results, vec![true, true, false, false]);
}

#[tokio::test]
async fn test_regex_on_empty_table_is_vacuous() {
    let mut checks = numbers_builder(0).await;
    checks
        .expect_column_values_to_match_regex("n", "^x$")
        .unwrap()
        .expect_column_values_to_not_match_regex("n", ".")
        .unwrap();

    let report = checks.run().await.unwrap();
    assert!(report.all_passed());
}

/// Counts operator lines in the physical plan of `EXPLAIN <sql>`.
async fn physical_operators(warehouse: &DataFusionWarehouse, sql: &str, operator: &str) -> usize {
    let batches = warehouse
        .context()
        .sql(&format!("EXPLAIN {sql}"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let mut plan = String::new();
    for batch in &batches {
        let kinds = cast(batch.column(0), &DataType::Utf8).unwrap();
        let kinds = kinds.as_any().downcast_ref::<StringArray>().unwrap();
        let plans = cast(batch.column(1), &DataType::Utf8).unwrap();
        let plans = plans.as_any().downcast_ref::<StringArray>().unwrap();
        for row in 0..batch.num_rows() {
            if kinds.value(row) == "physical_plan" {
                plan.push_str(plans.value(row));
            }
        }
    }
    assert!(!plan.is_empty(), "no physical plan in EXPLAIN output");
    plan.lines()
        .filter(|line| line.contains(operator) && !line.contains("mode=Partial"))
        .count()
}

#[tokio::test]
async fn test_table_is_scanned_once() {
    let (warehouse, mut checks) = users_builder().await;
    checks
        .expect_column_value_to_not_be_null("id")
        .unwrap()
        .expect_column_values_to_be_unique("age")
        .unwrap()
        .expect_column_value_mean_to_be_between("age", 10, 20)
        .unwrap()
        .expect_column_values_to_match_regex("email", "@")
        .unwrap()
        .expect_table_row_count_to_be_between(1, 10)
        .unwrap();

    let sql = checks.to_sql().unwrap();
    assert_eq!(physical_operators(warehouse.inner(), &sql, "DataSourceExec").await, 1);
    assert_eq!(physical_operators(warehouse.inner(), &sql, "AggregateExec").await, 1);
}

#[tokio::test]
async fn test_plain_glyphs() {
    let warehouse = users_warehouse();
    let mut checks = CheckBuilder::with_config(warehouse, users_table(), CheckConfig::plain())
        .await
        .unwrap();
    checks
        .expect_column_value_to_not_be_null("id")
        .unwrap()
        .expect_column_value_to_not_be_null("score")
        .unwrap();

    let report = checks.run().await.unwrap();
    let glyphs: Vec<_> = report.rows().iter().map(|r| r.pass_fail.as_str()).collect();
    assert_eq!(glyphs, vec!["PASS", "FAIL"]);
}

#[tokio::test]
async fn test_quoted_identifiers() {
    use arrow::array::Int64Array;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;

    let schema = Arc::new(Schema::new(vec![Field::new("o'clock \"x\"", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap();
    let warehouse = DataFusionWarehouse::new();
    warehouse.register_batches("odd_table", vec![batch]).unwrap();
    let table = warehouse.table_ref("odd_table");

    let mut checks = CheckBuilder::new(Arc::new(warehouse), table).await.unwrap();
    checks
        .expect_column_value_to_not_be_null("o'clock \"x\"")
        .unwrap()
        .expect_column_values_to_be_unique("o'clock \"x\"")
        .unwrap();

    let report = checks.run().await.unwrap();
    assert!(report.all_passed());
}
