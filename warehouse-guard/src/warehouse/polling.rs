//! Job-based warehouses.
//!
//! Remote warehouses usually don't answer a query inline. They accept a job,
//! report its state, and hand out results once it is done. [`JobClient`]
//! captures those three calls; [`PollingWarehouse`] turns any `JobClient` into
//! a [`Warehouse`] by polling the job with exponential backoff.
//!
//! A failed job is not resubmitted.

use super::Warehouse;
use crate::error::{GuardError, Result};
use crate::sql::Dialect;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Identifies a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Region or location the job runs in, when the API needs it to look the job up.
    pub location: Option<String>,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// State of a submitted job as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
    /// The job finished with an error; carries the warehouse's diagnostic.
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed(_))
    }
}

/// The three calls a job-based warehouse API must provide.
#[async_trait]
pub trait JobClient: Debug + Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Submits `sql` and returns the job handle without waiting.
    async fn submit(&self, sql: &str) -> Result<JobHandle>;

    /// Returns the current state of `job`.
    async fn status(&self, job: &JobHandle) -> Result<JobState>;

    /// Returns the results of a job in [`JobState::Done`].
    async fn fetch_results(&self, job: &JobHandle) -> Result<Vec<RecordBatch>>;
}

/// How long to wait between status calls, and for how long overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay before the second status call.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor applied after each status call. Values below 1 are treated as 1.
    pub multiplier: f64,
    /// Overall limit measured from submission. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// A fixed interval with no growth.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            multiplier: 1.0,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// The delay following `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// A [`Warehouse`] over a [`JobClient`].
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
/// use tokio::sync::watch;
/// use warehouse_guard::warehouse::{PollPolicy, PollingWarehouse};
///
/// let (cancel_tx, cancel_rx) = watch::channel(false);
/// let warehouse = PollingWarehouse::new(my_job_client)
///     .with_policy(PollPolicy::default().with_timeout(Duration::from_secs(300)))
///     .with_cancellation(cancel_rx);
///
/// // Elsewhere: cancel_tx.send(true) abandons the wait.
/// ```
#[derive(Debug)]
pub struct PollingWarehouse<C> {
    client: C,
    policy: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl<C: JobClient> PollingWarehouse<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: PollPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Abandons any wait once `true` is sent on the channel.
    ///
    /// The submitted job itself is left to the warehouse.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
        cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Polls `job` until it reaches a terminal state.
    async fn wait_for(&self, job: &JobHandle) -> Result<()> {
        let started = Instant::now();
        let mut delay = self.policy.initial_delay;
        let mut cancel = self.cancel.clone();
        let mut polls = 0u32;

        loop {
            if Self::is_cancelled(&cancel) {
                warn!(job_id = %job.job_id, "Wait cancelled");
                return Err(GuardError::QueryCancelled {
                    job_id: job.job_id.clone(),
                });
            }

            polls += 1;
            match self.client.status(job).await? {
                JobState::Done => {
                    debug!(job_id = %job.job_id, polls, "Job done");
                    return Ok(());
                }
                JobState::Failed(message) => {
                    warn!(job_id = %job.job_id, error = %message, "Job failed");
                    return Err(GuardError::warehouse_query_failed(message));
                }
                state => debug!(job_id = %job.job_id, ?state, "Job not finished"),
            }

            let mut wait = delay;
            if let Some(timeout) = self.policy.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    warn!(job_id = %job.job_id, elapsed_ms = elapsed.as_millis(), "Job timed out");
                    return Err(GuardError::QueryTimedOut {
                        job_id: job.job_id.clone(),
                        elapsed_ms: elapsed.as_millis(),
                    });
                }
                wait = wait.min(timeout - elapsed);
            }

            let sender_dropped = match cancel.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => false,
                        changed = rx.changed() => changed.is_err(),
                    }
                }
                None => {
                    tokio::time::sleep(wait).await;
                    false
                }
            };
            // Nobody can cancel any more.
            if sender_dropped {
                cancel = None;
            }

            delay = self.policy.next_delay(delay);
        }
    }
}

#[async_trait]
impl<C: JobClient> Warehouse for PollingWarehouse<C> {
    fn dialect(&self) -> Dialect {
        self.client.dialect()
    }

    #[instrument(skip(self, sql), fields(dialect = %self.client.dialect()))]
    async fn run_query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let job = self.client.submit(sql).await?;
        info!(job_id = %job.job_id, "Submitted query job");

        self.wait_for(&job).await?;
        self.client.fetch_results(&job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedClient {
        states: Mutex<VecDeque<JobState>>,
        status_calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(states: Vec<JobState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                status_calls: Mutex::new(0),
            }
        }

        fn status_calls(&self) -> u32 {
            *self.status_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl JobClient for ScriptedClient {
        fn dialect(&self) -> Dialect {
            Dialect::BigQuery
        }

        async fn submit(&self, _sql: &str) -> Result<JobHandle> {
            Ok(JobHandle::new("job_1").with_location("EU"))
        }

        async fn status(&self, _job: &JobHandle) -> Result<JobState> {
            *self.status_calls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            // The last scripted state repeats forever.
            if states.len() > 1 {
                Ok(states.pop_front().unwrap())
            } else {
                Ok(states.front().cloned().unwrap_or(JobState::Running))
            }
        }

        async fn fetch_results(&self, _job: &JobHandle) -> Result<Vec<RecordBatch>> {
            Ok(vec![])
        }
    }

    fn fast() -> PollPolicy {
        PollPolicy::fixed(Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = PollPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            multiplier: 2.0,
            timeout: None,
        };
        let second = policy.next_delay(policy.initial_delay);
        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(policy.next_delay(second), Duration::from_millis(350));
        assert_eq!(policy.next_delay(Duration::from_millis(350)), Duration::from_millis(350));
    }

    #[test]
    fn test_bad_multiplier_does_not_shrink() {
        let policy = PollPolicy::default().with_multiplier(f64::NAN);
        assert_eq!(
            policy.next_delay(Duration::from_millis(500)),
            Duration::from_millis(500)
        );
        let policy = PollPolicy::default().with_multiplier(0.1);
        assert_eq!(
            policy.next_delay(Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }

    #[tokio::test]
    async fn test_polls_until_done() {
        let client = ScriptedClient::new(vec![
            JobState::Pending,
            JobState::Running,
            JobState::Running,
            JobState::Done,
        ]);
        let warehouse = PollingWarehouse::new(client).with_policy(fast());

        let batches = warehouse.run_query("SELECT 1").await.unwrap();
        assert!(batches.is_empty());
        assert_eq!(warehouse.client().status_calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_job_carries_message() {
        let client = ScriptedClient::new(vec![
            JobState::Running,
            JobState::Failed("Unrecognized name: colour".to_string()),
        ]);
        let warehouse = PollingWarehouse::new(client).with_policy(fast());

        let err = warehouse.run_query("SELECT colour").await.unwrap_err();
        match err {
            GuardError::WarehouseQueryFailed { message, .. } => {
                assert_eq!(message, "Unrecognized name: colour")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let client = ScriptedClient::new(vec![JobState::Running]);
        let warehouse = PollingWarehouse::new(client)
            .with_policy(fast().with_timeout(Duration::from_millis(20)));

        let err = warehouse.run_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, GuardError::QueryTimedOut { ref job_id, .. } if job_id == "job_1"));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let client = ScriptedClient::new(vec![JobState::Running]);
        let warehouse = PollingWarehouse::new(client)
            .with_policy(PollPolicy::fixed(Duration::from_secs(60)))
            .with_cancellation(cancel_rx);

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_tx.send(true).unwrap();
        });

        let err = warehouse.run_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, GuardError::QueryCancelled { .. }));
        cancel.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_keeps_polling() {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        drop(cancel_tx);
        let client = ScriptedClient::new(vec![JobState::Running, JobState::Done]);
        let warehouse = PollingWarehouse::new(client)
            .with_policy(fast())
            .with_cancellation(cancel_rx);

        assert!(warehouse.run_query("SELECT 1").await.is_ok());
    }
}
