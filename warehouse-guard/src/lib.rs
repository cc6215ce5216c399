//! # warehouse-guard - Batched Data Expectations for SQL Warehouses
//!
//! warehouse-guard checks declarative expectations about a warehouse table
//! ("no NULLs in `user_id`", "mean `age` between 18 and 65", "between 1k and
//! 1M rows") and evaluates all of them with a single aggregate query. The
//! result is a tidy report with one row per expectation.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{Int64Array, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use warehouse_guard::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("user_id", DataType::Int64, true),
//!     Field::new("email", DataType::Utf8, true),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 2, 3])),
//!         Arc::new(StringArray::from(vec!["a@x.io", "b@x.io", "c@x.io"])),
//!     ],
//! )?;
//!
//! let warehouse = Arc::new(DataFusionWarehouse::new());
//! warehouse.register_batches("users", vec![batch])?;
//! let table = warehouse.table_ref("users");
//!
//! let mut checks = CheckBuilder::new(warehouse, table).await?;
//! checks
//!     .expect_column_value_to_not_be_null("user_id")?
//!     .expect_column_values_to_be_unique("user_id")?
//!     .expect_column_values_to_match_regex("email", r"^[^@]+@[^@]+$")?
//!     .expect_table_row_count_to_be_between(1, 10)?;
//!
//! let report = checks.run().await?;
//! assert!(report.all_passed());
//! println!("{}", HumanFormatter::new().format(&report)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## How a run works
//!
//! 1. [`CheckBuilder::new`](builder::CheckBuilder::new) fetches the table's
//!    column metadata once ([`schema::SchemaCatalog`]).
//! 2. Each `expect_*` call validates its column and arguments against that
//!    snapshot and appends an [`expectation::Expectation`]. Nothing touches
//!    the warehouse.
//! 3. [`CheckBuilder::run`](builder::CheckBuilder::run) renders one query that
//!    computes every predicate as a column of a single whole-table row,
//!    unpivots it to one row per check, and submits it once.
//!
//! Predicates are a small typed AST ([`sql::ast`]) rendered per
//! [`sql::Dialect`]; identifiers are quoted and literals escaped, so column
//! names and regex patterns never splice raw text into the query.
//!
//! ## Warehouses
//!
//! The warehouse is injected as an `Arc<dyn` [`warehouse::Warehouse`]`>`.
//! [`warehouse::DataFusionWarehouse`] runs in-process on DataFusion;
//! [`warehouse::PollingWarehouse`] adapts job-based remote APIs with bounded
//! exponential backoff, a timeout and cancellation.
//!
//! ## Architecture
//!
//! - **`builder`**: `CheckBuilder` and its lifecycle
//! - **`expectation`**: expectation kinds, check names, predicates
//! - **`sql`**: predicate AST, dialects, query rendering
//! - **`schema`**: column metadata snapshots
//! - **`warehouse`**: the warehouse collaborator and its implementations
//! - **`report`**: the tidy report
//! - **`formatters`**: JSON, console and Markdown output
//! - **`config`**, **`logging`**, **`security`**, **`error`**: ambient support

pub mod builder;
mod columnar;
pub mod config;
pub mod error;
pub mod expectation;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod schema;
pub mod security;
pub mod sql;
pub mod table;
pub mod warehouse;
