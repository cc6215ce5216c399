//! Runs checks through a job-based warehouse API.
//!
//! `SimulatedJobs` stands in for a remote service: it accepts a job, reports
//! it as pending and running for a few status calls, then serves results
//! computed by DataFusion. Run with `RUST_LOG=warehouse_guard=debug` to see
//! each poll.
//!
//! Run with:
//! ```bash
//! cargo run --example polling_warehouse
//! ```

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use warehouse_guard::logging::setup::{init_logging, LoggingConfig};
use warehouse_guard::prelude::*;
use warehouse_guard::warehouse::{JobClient, JobHandle, JobState, PollPolicy};

#[derive(Debug)]
struct SimulatedJobs {
    engine: DataFusionWarehouse,
    next_id: AtomicUsize,
    jobs: Mutex<HashMap<String, (String, usize)>>,
}

#[async_trait]
impl JobClient for SimulatedJobs {
    fn dialect(&self) -> Dialect {
        Dialect::DataFusion
    }

    async fn submit(&self, sql: &str) -> Result<JobHandle> {
        let id = format!("job_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs
            .lock()
            .map_err(|_| GuardError::Internal("job table poisoned".to_string()))?
            .insert(id.clone(), (sql.to_string(), 0));
        Ok(JobHandle::new(id).with_location("local"))
    }

    async fn status(&self, job: &JobHandle) -> Result<JobState> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| GuardError::Internal("job table poisoned".to_string()))?;
        let (_, polls) = jobs
            .get_mut(&job.job_id)
            .ok_or_else(|| GuardError::warehouse_query_failed(format!("unknown job {}", job.job_id)))?;
        *polls += 1;
        Ok(match *polls {
            1 => JobState::Pending,
            2 | 3 => JobState::Running,
            _ => JobState::Done,
        })
    }

    async fn fetch_results(&self, job: &JobHandle) -> Result<Vec<RecordBatch>> {
        let sql = self
            .jobs
            .lock()
            .map_err(|_| GuardError::Internal("job table poisoned".to_string()))?
            .get(&job.job_id)
            .map(|(sql, _)| sql.clone())
            .ok_or_else(|| GuardError::warehouse_query_failed(format!("unknown job {}", job.job_id)))?;
        self.engine.run_query(&sql).await
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default())?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("sku", DataType::Utf8, false),
        Field::new("stock", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["A-100", "A-101", "B-200", "B-201"])),
            Arc::new(Int64Array::from(vec![Some(12), Some(0), None, Some(7)])),
        ],
    )?;
    let engine = DataFusionWarehouse::new();
    engine.register_batches("inventory", vec![batch])?;
    let table = engine.table_ref("inventory");

    let jobs = SimulatedJobs {
        engine,
        next_id: AtomicUsize::new(0),
        jobs: Mutex::new(HashMap::new()),
    };

    // Dropping `cancel_tx` would stop cancellation; sending `true` aborts the wait.
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let warehouse = PollingWarehouse::new(jobs)
        .with_policy(
            PollPolicy::default()
                .with_max_delay(Duration::from_millis(200))
                .with_timeout(Duration::from_secs(30)),
        )
        .with_cancellation(cancel_rx);

    let mut checks = CheckBuilder::with_config(Arc::new(warehouse), table, CheckConfig::plain()).await?;
    checks
        .expect_column_values_to_be_unique("sku")?
        .expect_column_values_to_match_regex("sku", "^[A-Z]-[0-9]{3}$")?
        .expect_column_value_to_not_be_null("stock")?
        .expect_column_value_mean_to_be_between("stock", 1, 50)?;

    info!(checks = checks.len(), "Submitting inventory checks");
    let report = checks.run().await?;
    println!("{}", HumanFormatter::with_config(FormatterConfig::minimal()).format(&report)?);
    println!("{}", report.summary());

    Ok(())
}
