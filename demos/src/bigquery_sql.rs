//! Compiles a BigQuery check query without running it.
//!
//! The schema snapshot is supplied by hand, so no warehouse is contacted;
//! the printed SQL can be pasted into the BigQuery console.
//!
//! Run with:
//! ```bash
//! cargo run --example bigquery_sql
//! ```

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::sync::Arc;
use warehouse_guard::prelude::*;

/// Renders BigQuery SQL and refuses to execute anything.
#[derive(Debug)]
struct DryRun;

#[async_trait]
impl Warehouse for DryRun {
    fn dialect(&self) -> Dialect {
        Dialect::BigQuery
    }

    async fn run_query(&self, _sql: &str) -> Result<Vec<RecordBatch>> {
        Err(GuardError::warehouse_query_failed("dry run: queries are not executed"))
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let table: TableRef = "acme-analytics.sales.orders".parse()?;
    println!("Standard path: {}", table.path(PathStyle::Standard, ""));
    println!("Legacy path:   {}", table.path(PathStyle::Legacy, "20240301"));
    println!();

    let catalog = SchemaCatalog::from_columns(
        table,
        vec![
            ColumnMetadata::new("order_date", "DATE").with_partitioning(true),
            ColumnMetadata::new("order_id", "STRING").with_clustering_position(1),
            ColumnMetadata::new("customer_email", "STRING"),
            ColumnMetadata::new("amount", "NUMERIC"),
        ],
    )?;

    let mut checks = CheckBuilder::from_catalog(Arc::new(DryRun), catalog, CheckConfig::default());
    checks
        .expect_column_value_to_not_be_null("order_id")?
        .expect_column_values_to_be_unique("order_id")?
        .expect_column_value_mean_to_be_between("amount", 10, 250.5)?
        .expect_column_values_to_match_regex("customer_email", r"^[\w.+-]+@[\w-]+\.[\w.]+$")?
        .expect_column_values_to_not_match_regex("customer_email", "@test\\.invalid$")?
        .expect_table_row_count_to_be_between(1_000, 10_000_000)?;

    println!("{}", checks.to_sql()?);
    Ok(())
}
