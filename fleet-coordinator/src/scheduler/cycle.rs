//! Cycle controller
//!
//! One cycle claims a batch of tasks, prepares and submits them, then
//! reports every result the moment it resolves. Nothing survives from one
//! cycle to the next.

use anyhow::Error;
use async_trait::async_trait;
use fleet_core::domain::input::Input;
use fleet_core::domain::result::MeasurementResult;
use fleet_core::domain::task::Task;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::capability::{InputSelector, WorkQueue};
use crate::error::CycleError;
use crate::scheduler::dispatcher::{Batch, Dispatcher};
use crate::scheduler::poller::ResultSink;
use crate::scheduler::strategy::MeasurementStrategy;
use crate::service::LimitPolicy;

/// A task whose result reached the work queue
#[derive(Debug, Clone)]
pub struct Reported {
    pub task: Task,
    pub input: Input,
    pub result: MeasurementResult,
}

/// A task whose worker was lost before it produced a result
#[derive(Debug)]
pub struct AbandonedTask {
    pub task: Task,
    pub input: Input,
    pub error: Error,
}

/// A resolved task the work queue refused to take
///
/// The result is kept so the caller can retry the report.
#[derive(Debug)]
pub struct Unreported {
    pub task: Task,
    pub input: Input,
    pub result: MeasurementResult,
    pub error: Error,
}

/// Everything one cycle did
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub claimed: usize,
    /// Reported tasks, in the order they resolved
    pub reported: Vec<Reported>,
    pub abandoned: Vec<AbandonedTask>,
    pub unreported: Vec<Unreported>,
    pub polls: u64,
}

impl CycleOutcome {
    /// True when every claimed task was reported
    pub fn is_complete(&self) -> bool {
        self.reported.len() == self.claimed
    }
}

/// Runs claim, dispatch, poll and report for one batch
pub struct CycleController {
    queue: Arc<dyn WorkQueue>,
    dispatcher: Dispatcher,
    strategy: Arc<dyn MeasurementStrategy>,
}

impl CycleController {
    /// Creates a controller from its collaborators
    ///
    /// # Arguments
    /// * `queue` - Where tasks come from and results go to
    /// * `selector` - Chooses the input of every task
    /// * `limits` - Computes dispatch limits
    /// * `strategy` - Measures prepared batches
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        selector: Arc<dyn InputSelector>,
        limits: Arc<dyn LimitPolicy>,
        strategy: Arc<dyn MeasurementStrategy>,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&queue), selector, limits);
        Self {
            queue,
            dispatcher,
            strategy,
        }
    }

    /// Performs one full pass
    ///
    /// An empty claim returns an empty outcome without touching the workers.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let started = Instant::now();

        let tasks = self
            .queue
            .claim_batch()
            .await
            .map_err(|error| CycleError::ClaimFailure { error })?;

        if tasks.is_empty() {
            debug!("No tasks available");
            return Ok(CycleOutcome::default());
        }

        info!("Claimed {} task(s)", tasks.len());

        let batch = self.dispatcher.prepare(tasks, started).await?;
        let mut reporter = Reporter::new(self.queue.as_ref(), &batch);
        let summary = self.strategy.measure(&batch, &mut reporter).await?;

        let mut outcome = reporter.finish();
        outcome.polls = summary.polls;

        for abandoned in summary.abandoned {
            if let Some(slot) = batch.slot(abandoned.index) {
                outcome.abandoned.push(AbandonedTask {
                    task: slot.task.clone(),
                    input: slot.input.clone(),
                    error: abandoned.error,
                });
            }
        }

        info!(
            "Cycle finished in {:?}: {} reported, {} abandoned, {} unreported, {} poll(s)",
            started.elapsed(),
            outcome.reported.len(),
            outcome.abandoned.len(),
            outcome.unreported.len(),
            outcome.polls
        );

        Ok(outcome)
    }
}

/// Reports results to the work queue as the poller hands them over
struct Reporter<'a> {
    queue: &'a dyn WorkQueue,
    batch: &'a Batch,
    done: Vec<bool>,
    outcome: CycleOutcome,
}

impl<'a> Reporter<'a> {
    fn new(queue: &'a dyn WorkQueue, batch: &'a Batch) -> Self {
        Self {
            queue,
            batch,
            done: vec![false; batch.len()],
            outcome: CycleOutcome {
                claimed: batch.len(),
                ..CycleOutcome::default()
            },
        }
    }

    fn finish(self) -> CycleOutcome {
        self.outcome
    }
}

#[async_trait]
impl ResultSink for Reporter<'_> {
    async fn resolved(&mut self, index: usize, result: MeasurementResult) {
        let Some(slot) = self.batch.slot(index) else {
            warn!("Dropping result for unknown index {}", index);
            return;
        };

        if std::mem::replace(&mut self.done[index], true) {
            warn!("Task {} already reported, dropping duplicate", slot.task.id);
            return;
        }

        match self.queue.report(&slot.task, &result, &slot.input).await {
            Ok(()) => {
                debug!("Reported task {} ({})", slot.task.id, result.state);
                self.outcome.reported.push(Reported {
                    task: slot.task.clone(),
                    input: slot.input.clone(),
                    result,
                });
            }
            Err(error) => {
                warn!("Failed to report task {}: {:#}", slot.task.id, error);
                self.outcome.unreported.push(Unreported {
                    task: slot.task.clone(),
                    input: slot.input.clone(),
                    result,
                    error,
                });
            }
        }
    }
}
