//! Completion poller
//!
//! Waits for every submitted measurement with a round-robin scan over the
//! outstanding handles. Worker polls never block, so a single slow request
//! cannot starve the others: each sweep visits every outstanding handle once.
//!
//! Cursor rule: when the handle under the cursor resolves it is removed and
//! the cursor stays put, so the next handle slides into the same slot and is
//! polled next. Only a pending answer advances the cursor. Reaching the end
//! wraps to the start and finishes a sweep.

use anyhow::Error;
use async_trait::async_trait;
use fleet_core::domain::result::MeasurementResult;
use std::time::Duration;
use tracing::{debug, warn};

use crate::capability::{PollStatus, RequestHandle, WorkerPool};

/// Receives results as soon as they resolve
#[async_trait]
pub trait ResultSink: Send {
    /// Called exactly once per resolved request
    async fn resolved(&mut self, index: usize, result: MeasurementResult);
}

/// A request given up on because its worker could not be reached
#[derive(Debug)]
pub struct Abandoned {
    pub index: usize,
    pub error: Error,
}

/// What happened while polling one batch
#[derive(Debug, Default)]
pub struct PollSummary {
    /// Batch indices in the order they resolved
    pub resolved: Vec<usize>,
    pub abandoned: Vec<Abandoned>,
    /// Number of poll calls made
    pub polls: u64,
    /// Number of completed sweeps over the outstanding handles
    pub sweeps: u64,
}

/// Round-robin poller
#[derive(Debug, Clone)]
pub struct Poller {
    /// Pause after a sweep that resolved nothing; zero spins
    sweep_delay: Duration,
}

impl Poller {
    pub fn new(sweep_delay: Duration) -> Self {
        Self { sweep_delay }
    }

    /// Polls until every handle has resolved or been abandoned
    ///
    /// Results are handed to `sink` as they arrive, interleaved with polling.
    /// A poll error abandons that handle without retrying it.
    pub async fn poll_until_complete(
        &self,
        pool: &dyn WorkerPool,
        handles: Vec<RequestHandle>,
        sink: &mut dyn ResultSink,
    ) -> PollSummary {
        let submitted = handles.len();
        let mut outstanding = handles;
        let mut summary = PollSummary::default();
        let mut cursor = 0;
        let mut progressed = false;

        while !outstanding.is_empty() {
            if cursor >= outstanding.len() {
                cursor = 0;
                summary.sweeps += 1;
                if !progressed {
                    self.idle().await;
                }
                progressed = false;
            }

            summary.polls += 1;
            let status = pool.poll(&outstanding[cursor]).await;

            match status {
                Ok(PollStatus::Pending) => {
                    cursor += 1;
                }
                Ok(PollStatus::Ready(result)) => {
                    let handle = outstanding.remove(cursor);
                    progressed = true;
                    debug!(
                        "Request {} (index {}) resolved: {}",
                        handle.request_id, handle.index, result.state
                    );
                    summary.resolved.push(handle.index);
                    sink.resolved(handle.index, result).await;
                }
                Err(error) => {
                    let handle = outstanding.remove(cursor);
                    progressed = true;
                    warn!(
                        "Abandoning request {} (index {}): {:#}",
                        handle.request_id, handle.index, error
                    );
                    summary.abandoned.push(Abandoned {
                        index: handle.index,
                        error,
                    });
                }
            }
        }

        debug_assert_eq!(summary.resolved.len() + summary.abandoned.len(), submitted);
        summary
    }

    async fn idle(&self) {
        if self.sweep_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.sweep_delay).await;
        }
    }
}
