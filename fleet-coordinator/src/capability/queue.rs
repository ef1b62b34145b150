//! Work queue capability
//!
//! Handles communication with the work queue for task-related operations:
//! - Claiming batches of pending tasks
//! - Persisting selected inputs
//! - Reporting measurement results

use anyhow::{Context, Result};
use async_trait::async_trait;
use fleet_client::WorkQueueClient;
use fleet_core::domain::input::Input;
use fleet_core::domain::result::MeasurementResult;
use fleet_core::domain::task::Task;
use fleet_core::dto::task::ReportRequest;
use tracing::debug;

/// Store of tasks awaiting measurement
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Claims pending tasks for this coordinator
    ///
    /// Claiming must be atomic: a task returned here is never returned to
    /// another coordinator. An empty vector means there is nothing to do.
    async fn claim_batch(&self) -> Result<Vec<Task>>;

    /// Stores an input before it is used by any measurement
    async fn persist_input(&self, input: &Input) -> Result<()>;

    /// Resolves a claimed task with its result
    ///
    /// # Arguments
    /// * `task` - The claimed task, carrying the limit it was dispatched with
    /// * `result` - What the worker measured
    /// * `input` - The input the measurement ran on
    async fn report(&self, task: &Task, result: &MeasurementResult, input: &Input) -> Result<()>;
}

/// HTTP implementation of WorkQueue
pub struct HttpWorkQueue {
    client: WorkQueueClient,
    coordinator_id: String,
    batch_size: usize,
}

impl HttpWorkQueue {
    /// Creates a new HTTP work queue
    ///
    /// # Arguments
    /// * `client` - Client for the work queue API
    /// * `coordinator_id` - Identity claims are recorded under
    /// * `batch_size` - Maximum number of tasks claimed per cycle
    pub fn new(client: WorkQueueClient, coordinator_id: String, batch_size: usize) -> Self {
        Self {
            client,
            coordinator_id,
            batch_size,
        }
    }
}

#[async_trait]
impl WorkQueue for HttpWorkQueue {
    async fn claim_batch(&self) -> Result<Vec<Task>> {
        let tasks = self
            .client
            .claim_batch(&self.coordinator_id, self.batch_size)
            .await
            .with_context(|| format!("Failed to claim tasks from {}", self.client.base_url()))?;

        debug!("Work queue handed out {} task(s)", tasks.len());
        Ok(tasks)
    }

    async fn persist_input(&self, input: &Input) -> Result<()> {
        self.client
            .put_input(input)
            .await
            .with_context(|| format!("Failed to persist input {}", input.id))
    }

    async fn report(&self, task: &Task, result: &MeasurementResult, input: &Input) -> Result<()> {
        let report = ReportRequest {
            coordinator_id: self.coordinator_id.clone(),
            input_id: input.id,
            limit_seconds: task.limit_seconds,
            result: result.clone(),
        };

        self.client
            .report(task.id, &report)
            .await
            .with_context(|| format!("Failed to report result for task {}", task.id))
    }
}
