//! The warehouse collaborator.
//!
//! warehouse-guard never talks to a network client directly. Everything it
//! needs from a warehouse is the [`Warehouse`] trait: the dialect to render
//! for, a metadata query, and a query-submission call that returns arrow
//! batches. Connection lifecycle, authentication, pagination and timeouts
//! belong to the implementation.
//!
//! Two implementations ship with the crate:
//!
//! - [`DataFusionWarehouse`] runs queries in-process over a DataFusion
//!   session, for local files, tests and CI.
//! - [`PollingWarehouse`] adapts any job-based API (submit, poll, fetch) by
//!   waiting for job completion with bounded exponential backoff.

use crate::error::Result;
use crate::sql::Dialect;
use crate::table::TableRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::fmt::Debug;

mod datafusion;
pub mod polling;

pub use self::datafusion::{DataFusionWarehouse, DataFusionWarehouseConfig};
pub use polling::{JobClient, JobHandle, JobState, PollPolicy, PollingWarehouse};

/// A warehouse that can answer metadata and check queries.
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse_guard::warehouse::Warehouse;
///
/// #[derive(Debug)]
/// struct MyWarehouse { /* client handle */ }
///
/// #[async_trait::async_trait]
/// impl Warehouse for MyWarehouse {
///     fn dialect(&self) -> Dialect {
///         Dialect::BigQuery
///     }
///
///     async fn run_query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
///         // submit `sql`, wait, return the rows
///     }
/// }
/// ```
#[async_trait]
pub trait Warehouse: Debug + Send + Sync {
    /// The dialect queries for this warehouse must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Returns the column metadata rows of `table`.
    ///
    /// The rows carry `column_name`, `data_type`, `is_partitioning_column`
    /// and `clustering_ordinal_position`. The default renders the dialect's
    /// metadata query and submits it through [`Warehouse::run_query`].
    async fn run_schema_query(&self, table: &TableRef) -> Result<Vec<RecordBatch>> {
        let sql = self.dialect().schema_query(table)?;
        self.run_query(&sql).await
    }

    /// Submits `sql` and returns its materialized result.
    ///
    /// Failures should be reported as
    /// [`GuardError::WarehouseQueryFailed`](crate::error::GuardError::WarehouseQueryFailed)
    /// carrying the warehouse's own diagnostic.
    async fn run_query(&self, sql: &str) -> Result<Vec<RecordBatch>>;
}
