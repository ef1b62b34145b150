//! Dispatcher
//!
//! Turns claimed tasks into a batch of measurement requests and submits it.
//! The position of a task in the batch is its index; every handle coming
//! back from the worker pool is matched to its task through that index only.

use anyhow::Result;
use fleet_core::domain::input::Input;
use fleet_core::domain::task::Task;
use fleet_core::dto::measurement::MeasurementRequest;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

use crate::capability::{InputSelector, RequestHandle, WorkQueue, WorkerPool};
use crate::error::CycleError;
use crate::service::LimitPolicy;

/// A claimed task paired with the input chosen for it
#[derive(Debug, Clone)]
pub struct Slot {
    pub task: Task,
    pub input: Input,
}

/// Correlation table of one cycle, indexed by submission position
#[derive(Debug, Clone, Default)]
pub struct Batch {
    slots: Vec<Slot>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The task and input submitted at `index`
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Clones the tasks of the batch, in claim order
    pub fn tasks(&self) -> Vec<Task> {
        self.slots.iter().map(|slot| slot.task.clone()).collect()
    }

    /// Builds the wire requests, in index order
    pub fn requests(&self) -> Vec<MeasurementRequest> {
        self.slots
            .iter()
            .map(|slot| MeasurementRequest {
                configuration: slot.task.configuration.clone(),
                input: slot.input.clone(),
                limit_seconds: slot.task.limit_seconds.unwrap_or_default(),
            })
            .collect()
    }
}

/// Prepares claimed tasks for submission
pub struct Dispatcher {
    queue: Arc<dyn WorkQueue>,
    selector: Arc<dyn InputSelector>,
    limits: Arc<dyn LimitPolicy>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        selector: Arc<dyn InputSelector>,
        limits: Arc<dyn LimitPolicy>,
    ) -> Self {
        Self {
            queue,
            selector,
            limits,
        }
    }

    /// Builds the batch for `tasks`, in claim order
    ///
    /// Each task gets a limit computed from the time elapsed since `started`
    /// at the moment it is prepared, then an input which is persisted before
    /// the pre-dispatch hook runs. On failure every claimed task is handed
    /// back inside the error.
    pub async fn prepare(&self, tasks: Vec<Task>, started: Instant) -> Result<Batch, CycleError> {
        let mut slots = Vec::with_capacity(tasks.len());
        let mut pending = tasks.into_iter();

        while let Some(mut task) = pending.next() {
            let limit = self.limits.limit(&task, started.elapsed());
            task.set_limit(limit);

            match self.prepare_one(&task).await {
                Ok(input) => {
                    debug!(
                        "Running task {} on input {} (limit {:?})",
                        task.id, input.id, limit
                    );
                    slots.push(Slot { task, input });
                }
                Err(error) => {
                    let task_id = task.id;
                    let mut tasks: Vec<Task> = slots.into_iter().map(|slot| slot.task).collect();
                    tasks.push(task);
                    tasks.extend(pending);
                    return Err(CycleError::Dispatch {
                        task_id,
                        tasks,
                        error,
                    });
                }
            }
        }

        Ok(Batch { slots })
    }

    async fn prepare_one(&self, task: &Task) -> Result<Input> {
        let input = self.selector.select(task).await?;
        self.queue.persist_input(&input).await?;
        self.selector.before_dispatch(task, &input).await?;
        Ok(input)
    }
}

/// Submits the whole batch with a single call to the pool
///
/// The returned handles are checked to cover every index of the batch exactly
/// once; their order is left as the pool returned it.
pub async fn submit(
    pool: &dyn WorkerPool,
    batch: &Batch,
) -> Result<Vec<RequestHandle>, CycleError> {
    let handles = pool
        .submit(batch.requests())
        .await
        .map_err(|error| CycleError::Submit {
            tasks: batch.tasks(),
            error,
        })?;

    check_handles(&handles, batch.len()).map_err(|reason| CycleError::HandleMismatch {
        tasks: batch.tasks(),
        reason,
    })?;

    Ok(handles)
}

fn check_handles(handles: &[RequestHandle], expected: usize) -> Result<(), String> {
    if handles.len() != expected {
        return Err(format!(
            "expected {} handle(s), got {}",
            expected,
            handles.len()
        ));
    }

    let mut seen = vec![false; expected];
    for handle in handles {
        match seen.get_mut(handle.index) {
            None => return Err(format!("handle index {} is out of range", handle.index)),
            Some(true) => return Err(format!("index {} was returned twice", handle.index)),
            Some(flag) => *flag = true,
        }
    }

    Ok(())
}
