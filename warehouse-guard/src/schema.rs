//! Column metadata snapshots.
//!
//! A [`SchemaCatalog`] is fetched once per builder and never refreshed. It is
//! a point-in-time view: a column dropped after the fetch is still "known"
//! until the next builder is created.

use crate::columnar::{int_column, string_column, string_value};
use crate::error::{GuardError, Result};
use crate::table::TableRef;
use crate::warehouse::Warehouse;
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// One column of the target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub column_name: String,
    pub data_type: String,
    pub is_partitioning_column: bool,
    pub clustering_ordinal_position: Option<i64>,
}

impl ColumnMetadata {
    /// A plain column: not a partitioning column, not clustered.
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_partitioning_column: false,
            clustering_ordinal_position: None,
        }
    }

    pub fn with_partitioning(mut self, is_partitioning_column: bool) -> Self {
        self.is_partitioning_column = is_partitioning_column;
        self
    }

    pub fn with_clustering_position(mut self, position: i64) -> Self {
        self.clustering_ordinal_position = Some(position);
        self
    }
}

/// Cached column metadata for one table.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    table: TableRef,
    columns: Vec<ColumnMetadata>,
    index: HashMap<String, usize>,
    fetched_at: DateTime<Utc>,
}

impl SchemaCatalog {
    /// Fetches the column metadata of `table` with a single metadata query.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::SchemaUnavailable`] if the warehouse call fails,
    /// returns rows that can't be decoded, or returns no rows at all (the
    /// table doesn't exist or has no columns; the two aren't distinguished).
    #[instrument(skip(warehouse), fields(table = %table, dialect = %warehouse.dialect()))]
    pub async fn fetch(warehouse: &dyn Warehouse, table: &TableRef) -> Result<Self> {
        let batches = warehouse.run_schema_query(table).await.map_err(|e| {
            warn!(error = %e, "Metadata query failed");
            GuardError::schema_unavailable_with_source(
                table.to_string(),
                "metadata query failed",
                Box::new(e),
            )
        })?;

        let catalog = Self::from_batches(table.clone(), &batches)?;
        debug!(columns = catalog.len(), "Fetched table metadata");
        Ok(catalog)
    }

    /// Builds a catalog from metadata rows shaped like the metadata query's output.
    pub fn from_batches(table: TableRef, batches: &[RecordBatch]) -> Result<Self> {
        let shape_error = |e: GuardError| {
            GuardError::schema_unavailable_with_source(
                table.to_string(),
                "metadata rows could not be decoded",
                Box::new(e),
            )
        };

        let mut columns = Vec::new();
        for batch in batches.iter().filter(|b| b.num_rows() > 0) {
            let names = string_column(batch, "column_name").map_err(shape_error)?;
            let types = string_column(batch, "data_type").map_err(shape_error)?;
            let partitioning = string_column(batch, "is_partitioning_column").map_err(shape_error)?;
            let clustering = int_column(batch, "clustering_ordinal_position").map_err(shape_error)?;

            for row in 0..batch.num_rows() {
                let Some(column_name) = string_value(&names, row) else {
                    continue;
                };
                columns.push(ColumnMetadata {
                    column_name,
                    data_type: string_value(&types, row).unwrap_or_default(),
                    is_partitioning_column: string_value(&partitioning, row)
                        .is_some_and(|v| v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("true")),
                    clustering_ordinal_position: clustering
                        .is_valid(row)
                        .then(|| clustering.value(row)),
                });
            }
        }

        Self::from_columns(table, columns)
    }

    /// Builds a catalog from already known columns.
    ///
    /// # Errors
    ///
    /// [`GuardError::SchemaUnavailable`] if `columns` is empty or names a
    /// column twice.
    pub fn from_columns(table: TableRef, columns: Vec<ColumnMetadata>) -> Result<Self> {
        if columns.is_empty() {
            return Err(GuardError::schema_unavailable(
                table.to_string(),
                "table not found or has no columns",
            ));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.column_name.clone(), i).is_some() {
                return Err(GuardError::schema_unavailable(
                    table.to_string(),
                    format!("column '{}' listed more than once", column.column_name),
                ));
            }
        }

        Ok(Self {
            table,
            columns,
            index,
            fetched_at: Utc::now(),
        })
    }

    /// Case-sensitive exact lookup.
    pub fn column_exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Columns in ordinal order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn partitioning_column(&self) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.is_partitioning_column)
    }

    /// Clustering columns ordered by clustering position.
    pub fn clustering_columns(&self) -> Vec<&ColumnMetadata> {
        let mut clustered: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.clustering_ordinal_position.is_some())
            .collect();
        clustered.sort_by_key(|c| c.clustering_ordinal_position);
        clustered
    }
}
