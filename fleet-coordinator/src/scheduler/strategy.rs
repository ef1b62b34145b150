//! Measurement strategies
//!
//! A strategy owns how a prepared batch gets measured. The cycle controller
//! is handed one at construction and never looks inside it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::capability::WorkerPool;
use crate::error::CycleError;
use crate::scheduler::dispatcher::{self, Batch};
use crate::scheduler::poller::{PollSummary, Poller, ResultSink};

/// Measures a prepared batch
#[async_trait]
pub trait MeasurementStrategy: Send + Sync {
    /// Runs every request of `batch` and feeds each result to `sink` as soon
    /// as it is available
    async fn measure(
        &self,
        batch: &Batch,
        sink: &mut dyn ResultSink,
    ) -> Result<PollSummary, CycleError>;
}

/// Ships the batch to a remote worker pool and polls for completions
pub struct WorkerPoolStrategy {
    pool: Arc<dyn WorkerPool>,
    poller: Poller,
}

impl WorkerPoolStrategy {
    pub fn new(pool: Arc<dyn WorkerPool>, poller: Poller) -> Self {
        Self { pool, poller }
    }
}

#[async_trait]
impl MeasurementStrategy for WorkerPoolStrategy {
    async fn measure(
        &self,
        batch: &Batch,
        sink: &mut dyn ResultSink,
    ) -> Result<PollSummary, CycleError> {
        if batch.is_empty() {
            return Ok(PollSummary::default());
        }

        let handles = dispatcher::submit(self.pool.as_ref(), batch).await?;

        info!(
            "Submitted {} request(s) to {} worker(s)",
            handles.len(),
            self.pool.size()
        );

        let summary = self
            .poller
            .poll_until_complete(self.pool.as_ref(), handles, sink)
            .await;

        debug!(
            "Batch settled after {} sweep(s) and {} poll(s): {} resolved, {} abandoned",
            summary.sweeps,
            summary.polls,
            summary.resolved.len(),
            summary.abandoned.len()
        );

        Ok(summary)
    }
}
