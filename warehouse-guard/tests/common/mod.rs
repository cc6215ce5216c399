//! Shared fixtures for integration tests.
#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warehouse_guard::error::Result;
use warehouse_guard::sql::Dialect;
use warehouse_guard::table::TableRef;
use warehouse_guard::warehouse::{DataFusionWarehouse, Warehouse};

/// Wraps a warehouse and records every check query submitted to it.
#[derive(Debug)]
pub struct CountingWarehouse<W> {
    inner: W,
    schema_queries: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl<W: Warehouse> CountingWarehouse<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            schema_queries: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    pub fn schema_queries(&self) -> usize {
        self.schema_queries.load(Ordering::SeqCst)
    }

    /// Queries submitted through `run_query`, excluding metadata queries.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl<W: Warehouse> Warehouse for CountingWarehouse<W> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn run_schema_query(&self, table: &TableRef) -> Result<Vec<RecordBatch>> {
        self.schema_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.run_schema_query(table).await
    }

    async fn run_query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        self.queries.lock().unwrap().push(sql.to_string());
        self.inner.run_query(sql).await
    }
}

/// A `users` table:
///
/// | id | age  | email           | score |
/// |----|------|-----------------|-------|
/// | 1  | 10   | alice@acme.com  | 1.5   |
/// | 2  | 20   | bob@acme.com    | NULL  |
/// | 3  | 15   | carol@acme.com  | 2.5   |
/// | 4  | 15   | dave@other.org  | 3.5   |
///
/// `id` is unique and complete, `age` has mean 15 and a duplicate,
/// `score` has one NULL.
pub fn users_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("age", DataType::Int64, true),
        Field::new("email", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
        Arc::new(Int64Array::from(vec![10, 20, 15, 15])),
        Arc::new(StringArray::from(vec![
            Some("alice@acme.com"),
            Some("bob@acme.com"),
            Some("carol@acme.com"),
            Some("dave@other.org"),
        ])),
        Arc::new(Float64Array::from(vec![Some(1.5), None, Some(2.5), Some(3.5)])),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

/// A single-column `n` table with `rows` rows.
pub fn numbers_batch(rows: i64) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
    RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from((0..rows).collect::<Vec<_>>()))],
    )
    .unwrap()
}

/// A DataFusion warehouse with `users` registered.
pub fn users_warehouse() -> Arc<CountingWarehouse<DataFusionWarehouse>> {
    let warehouse = DataFusionWarehouse::new();
    warehouse.register_batches("users", vec![users_batch()]).unwrap();
    Arc::new(CountingWarehouse::new(warehouse))
}

pub fn users_table() -> TableRef {
    TableRef::new("datafusion", "public", "users")
}
