//! Work queue DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::MeasurementResult;

/// Request to atomically claim up to `max_tasks` pending tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimBatchRequest {
    pub coordinator_id: String,
    pub max_tasks: usize,
}

/// Final result of a task, sent back to the work queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub coordinator_id: String,
    pub input_id: Uuid,
    /// Limit the task was dispatched with, in seconds
    pub limit_seconds: Option<f64>,
    pub result: MeasurementResult,
}

