//! Basic validation example demonstrating warehouse-guard's core functionality.
//!
//! This example shows how to:
//! - Register a CSV file with the in-process DataFusion warehouse
//! - Chain expectations on a CheckBuilder
//! - Run them as one query and print the report in three formats
//!
//! Run with:
//! ```bash
//! cargo run --example basic_validation
//! ```

use std::sync::Arc;
use warehouse_guard::logging::setup::{init_logging, LoggingConfig};
use warehouse_guard::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default())?;

    let csv_data = r#"customer_id,name,email,age,last_purchase_amount
1,Alice Johnson,alice@example.com,28,150.50
2,Bob Smith,bob@example.com,35,200.00
3,Carol Davis,carol@example.com,42,75.25
4,David Wilson,david@example.com,31,300.00
5,Eve Brown,eve@example.com,26,125.75
6,Frank Miller,,38,180.00
7,Grace Lee,grace@example.com,29,
8,Henry Taylor,henry@example,,220.50
9,Iris Martinez,iris@example.com,33,195.25
10,Jack Anderson,jack@example.com,45,400.00"#;

    let file_path = std::env::temp_dir().join("warehouse_guard_customers.csv");
    std::fs::write(&file_path, csv_data)?;
    let path = file_path
        .to_str()
        .ok_or("temporary path is not valid UTF-8")?;

    let warehouse = Arc::new(DataFusionWarehouse::new());
    warehouse.register_csv("customers", path).await?;
    let table = warehouse.table_ref("customers");

    println!("Running basic validation example...\n");

    let mut checks = CheckBuilder::new(warehouse, table).await?;
    checks
        .expect_column_value_to_not_be_null("customer_id")?
        .expect_column_values_to_be_unique("customer_id")?
        .expect_column_value_to_not_be_null("email")?
        .expect_column_values_to_match_regex("email", r"^[^@]+@[^@]+[.][a-z]+$")?
        .expect_column_value_mean_to_be_between("age", 25, 40)?
        .expect_table_row_count_to_be_between(5, 100)?;

    // Validation errors surface at the call that caused them.
    if let Err(e) = checks.expect_column_value_to_not_be_null("phone") {
        println!("Rejected expectation: {e}\n");
    }

    let report = checks.run().await?;

    println!("{}", HumanFormatter::new().format(&report)?);
    println!(
        "{}",
        MarkdownFormatter::new().format_with_config(&report, &FormatterConfig::minimal())?
    );
    println!(
        "{}",
        JsonFormatter::with_config(FormatterConfig::ci()).format(&report)?
    );

    std::fs::remove_file(&file_path).ok();

    Ok(())
}
