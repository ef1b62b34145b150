//! Errors that abort a whole measurement cycle
//!
//! Failures that only affect a single task (an unreachable worker, a failed
//! report) are not errors here; they are returned in the cycle outcome.

use fleet_core::domain::task::Task;
use thiserror::Error;
use uuid::Uuid;

/// A cycle that could not make progress
///
/// Every variant raised after the claim hands the claimed tasks back, so the
/// caller can return them to the queue.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The work queue is unreachable or answered with malformed data
    #[error("Failed to claim tasks: {error:#}")]
    ClaimFailure { error: anyhow::Error },

    /// Selecting, persisting or staging the input of a task failed
    #[error("Failed to prepare task {task_id}: {error:#}")]
    Dispatch {
        task_id: Uuid,
        tasks: Vec<Task>,
        error: anyhow::Error,
    },

    /// The worker pool refused the batch
    #[error("Failed to submit {} measurement(s): {error:#}", .tasks.len())]
    Submit {
        tasks: Vec<Task>,
        error: anyhow::Error,
    },

    /// The worker pool returned handles that cannot be matched to the batch
    #[error("Worker pool returned unusable handles: {reason}")]
    HandleMismatch { tasks: Vec<Task>, reason: String },
}

impl CycleError {
    /// Claimed tasks that were never reported
    pub fn claimed_tasks(&self) -> &[Task] {
        match self {
            CycleError::ClaimFailure { .. } => &[],
            CycleError::Dispatch { tasks, .. }
            | CycleError::Submit { tasks, .. }
            | CycleError::HandleMismatch { tasks, .. } => tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::domain::task::Configuration;

    #[test]
    fn test_claimed_tasks() {
        let claim = CycleError::ClaimFailure {
            error: anyhow::anyhow!("connection refused"),
        };
        assert!(claim.claimed_tasks().is_empty());
        assert_eq!(
            claim.to_string(),
            "Failed to claim tasks: connection refused"
        );

        let task = Task::new(Configuration::new(serde_json::json!({})));
        let submit = CycleError::Submit {
            tasks: vec![task.clone()],
            error: anyhow::anyhow!("worker down"),
        };
        assert_eq!(submit.claimed_tasks(), &[task]);
        assert_eq!(
            submit.to_string(),
            "Failed to submit 1 measurement(s): worker down"
        );
    }
}
