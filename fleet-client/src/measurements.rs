//! Measurement worker endpoints

use crate::error::{ClientError, Result};
use crate::{WorkerClient, handle_empty_response, handle_response};
use fleet_core::dto::measurement::{PollResponse, SubmitBatch, Submitted};

impl WorkerClient {
    /// Submit a batch of measurements to this worker
    ///
    /// # Returns
    /// One acknowledgement per request, in the order the requests were sent
    pub async fn submit(&self, batch: &SubmitBatch) -> Result<Vec<Submitted>> {
        let url = format!("{}/api/measurements", self.base_url);
        let response = self.client.post(&url).json(batch).send().await?;

        let submitted: Vec<Submitted> = handle_response(response).await?;
        if submitted.len() != batch.requests.len() {
            return Err(ClientError::ParseError(format!(
                "worker acknowledged {} of {} request(s)",
                submitted.len(),
                batch.requests.len()
            )));
        }

        Ok(submitted)
    }

    /// Check on a submitted measurement without waiting for it
    pub async fn poll(&self, request_id: &str) -> Result<PollResponse> {
        let url = format!("{}/api/measurements/{}", self.base_url, request_id);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Check that the worker is up and accepting requests
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_empty_response(response).await
    }
}
