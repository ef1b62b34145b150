//! Work queue endpoints

use crate::error::Result;
use crate::{WorkQueueClient, handle_empty_response, handle_response};
use fleet_core::domain::input::Input;
use fleet_core::domain::task::Task;
use fleet_core::dto::task::{ClaimBatchRequest, ReportRequest};
use tracing::debug;
use uuid::Uuid;

impl WorkQueueClient {
    // =============================================================================
    // Task Lifecycle
    // =============================================================================

    /// Atomically claim up to `max_tasks` pending tasks for a coordinator
    ///
    /// The work queue guarantees that a task returned here is not handed to
    /// any other coordinator.
    ///
    /// # Example
    /// ```no_run
    /// # use fleet_client::WorkQueueClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = WorkQueueClient::new("http://localhost:8080");
    /// let tasks = client.claim_batch("coordinator-1", 16).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn claim_batch(&self, coordinator_id: &str, max_tasks: usize) -> Result<Vec<Task>> {
        let url = format!("{}/api/tasks/claim", self.base_url);
        debug!("Claiming up to {} task(s) from {}", max_tasks, url);

        let response = self
            .client
            .post(&url)
            .json(&ClaimBatchRequest {
                coordinator_id: coordinator_id.to_string(),
                max_tasks,
            })
            .send()
            .await?;

        handle_response(response).await
    }

    /// Report the result of a task
    ///
    /// # Arguments
    /// * `task_id` - The task being resolved
    /// * `report` - The result together with the input it was measured on
    pub async fn report(&self, task_id: Uuid, report: &ReportRequest) -> Result<()> {
        let url = format!("{}/api/tasks/{}/report", self.base_url, task_id);
        let response = self.client.post(&url).json(report).send().await?;

        handle_empty_response(response).await
    }

    // =============================================================================
    // Inputs
    // =============================================================================

    /// Store an input so it is visible before any measurement uses it
    ///
    /// This is an upsert keyed on the input id, so storing the same input
    /// twice is harmless.
    pub async fn put_input(&self, input: &Input) -> Result<()> {
        let url = format!("{}/api/inputs/{}", self.base_url, input.id);
        let response = self.client.put(&url).json(input).send().await?;

        handle_empty_response(response).await
    }
}
