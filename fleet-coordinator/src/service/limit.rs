//! Limit policy
//!
//! Decides how long a worker may spend measuring a task.

use fleet_core::domain::task::Task;
use std::time::Duration;

/// Computes the dispatch limit of a task
pub trait LimitPolicy: Send + Sync {
    /// Returns the limit for `task`
    ///
    /// # Arguments
    /// * `task` - The task being prepared, possibly carrying its own limit
    /// * `elapsed` - Wall-clock time spent in the current cycle so far
    fn limit(&self, task: &Task, elapsed: Duration) -> Duration;
}

/// Spends a fixed time budget per cycle
///
/// Every task in a cycle shares the same budget, so tasks prepared later in a
/// batch get whatever is left of it. The result never drops below `min_limit`
/// and never exceeds a limit the task already carries.
#[derive(Debug, Clone)]
pub struct BudgetLimitPolicy {
    time_limit: Duration,
    min_limit: Duration,
}

impl BudgetLimitPolicy {
    pub fn new(time_limit: Duration, min_limit: Duration) -> Self {
        Self {
            time_limit,
            min_limit,
        }
    }
}

impl LimitPolicy for BudgetLimitPolicy {
    fn limit(&self, task: &Task, elapsed: Duration) -> Duration {
        let remaining = self.time_limit.saturating_sub(elapsed).max(self.min_limit);

        match task.limit() {
            Some(own) => own.min(remaining),
            None => remaining,
        }
    }
}
