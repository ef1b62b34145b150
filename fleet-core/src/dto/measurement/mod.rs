//! Measurement DTOs
//!
//! Bodies exchanged with the remote workers that run measurements.

use serde::{Deserialize, Serialize};

use crate::domain::input::Input;
use crate::domain::result::MeasurementResult;
use crate::domain::task::Configuration;

/// Identifies the measurement interface a worker should load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementInterface {
    /// Repository holding the tuner
    pub repo: String,
    /// Path of the tuner inside the repository
    pub path: String,
    /// Name of the measurement interface to instantiate
    pub name: String,
}

/// One measurement to run: what to run, on which input, within which limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRequest {
    pub configuration: Configuration,
    pub input: Input,
    pub limit_seconds: f64,
}

/// A batch of measurements sent to a single worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBatch {
    pub interface: MeasurementInterface,
    pub requests: Vec<MeasurementRequest>,
}

/// Acknowledgement for one submitted measurement, in submission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submitted {
    pub request_id: String,
}

/// State of a submitted measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollResponse {
    Pending,
    Complete { result: MeasurementResult },
}
