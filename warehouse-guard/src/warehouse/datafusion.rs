//! In-process warehouse backed by DataFusion.

use super::Warehouse;
use crate::error::{GuardError, Result};
use crate::sql::Dialect;
use crate::table::TableRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::{MemTable, TableProvider};
use datafusion::execution::context::{SessionConfig, SessionContext};
use datafusion::prelude::CsvReadOptions;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Catalog DataFusion registers tables in unless configured otherwise.
pub const DEFAULT_CATALOG: &str = "datafusion";
/// Schema DataFusion registers tables in unless configured otherwise.
pub const DEFAULT_SCHEMA: &str = "public";

/// Configuration for a [`DataFusionWarehouse`].
#[derive(Debug, Clone)]
pub struct DataFusionWarehouseConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
}

impl Default for DataFusionWarehouseConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
        }
    }
}

/// A [`Warehouse`] over a DataFusion [`SessionContext`].
///
/// The session always has the information schema enabled, since the schema
/// catalog reads `information_schema.columns`.
///
/// # Examples
///
/// ```rust,no_run
/// use warehouse_guard::warehouse::DataFusionWarehouse;
///
/// # async fn example() -> warehouse_guard::error::Result<()> {
/// let warehouse = DataFusionWarehouse::new();
/// warehouse.register_csv("orders", "data/orders.csv").await?;
/// let table = warehouse.table_ref("orders");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DataFusionWarehouse {
    ctx: SessionContext,
    config: DataFusionWarehouseConfig,
}

impl std::fmt::Debug for DataFusionWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionWarehouse")
            .field("session_id", &self.ctx.session_id())
            .field("config", &self.config)
            .finish()
    }
}

impl DataFusionWarehouse {
    /// Creates a warehouse with default configuration.
    pub fn new() -> Self {
        Self::with_config(DataFusionWarehouseConfig::default())
    }

    /// Creates a warehouse with custom configuration.
    pub fn with_config(config: DataFusionWarehouseConfig) -> Self {
        let session_config = SessionConfig::new()
            .with_batch_size(config.batch_size)
            .with_target_partitions(config.target_partitions)
            .with_information_schema(true);

        Self {
            ctx: SessionContext::new_with_config(session_config),
            config,
        }
    }

    /// The underlying session, for registering sources this type has no helper for.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn config(&self) -> &DataFusionWarehouseConfig {
        &self.config
    }

    /// A reference to a table registered under `name` in the default catalog and schema.
    pub fn table_ref(&self, name: &str) -> TableRef {
        TableRef::new(DEFAULT_CATALOG, DEFAULT_SCHEMA, name)
    }

    /// Registers in-memory batches as a table.
    ///
    /// All batches must share the schema of the first one. An empty table
    /// needs at least one (zero-row) batch to carry its schema.
    pub fn register_batches(&self, name: &str, batches: Vec<RecordBatch>) -> Result<()> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| {
                GuardError::invalid_argument("batches", "at least one batch is required")
            })?;
        let table = MemTable::try_new(schema, vec![batches])?;
        self.register_table_provider(name, Arc::new(table))
    }

    /// Registers any table provider.
    pub fn register_table_provider(
        &self,
        name: &str,
        provider: Arc<dyn TableProvider>,
    ) -> Result<()> {
        self.ctx.register_table(name, provider)?;
        debug!(table = name, "Registered table");
        Ok(())
    }

    /// Registers a CSV file as a table.
    #[instrument(skip(self))]
    pub async fn register_csv(&self, name: &str, path: &str) -> Result<()> {
        self.ctx
            .register_csv(name, path, CsvReadOptions::default())
            .await?;
        Ok(())
    }
}

impl Default for DataFusionWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Warehouse for DataFusionWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DataFusion
    }

    async fn run_query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let df = self
            .ctx
            .sql(sql)
            .await
            .map_err(|e| GuardError::warehouse_query_failed_with_source(Box::new(e)))?;
        df.collect()
            .await
            .map_err(|e| GuardError::warehouse_query_failed_with_source(Box::new(e)))
    }
}
