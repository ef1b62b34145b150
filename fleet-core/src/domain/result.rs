//! Measurement result domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of measuring one configuration on one input
///
/// Produced by a worker and consumed exactly once by the report step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub state: ResultState,
    pub time: Option<f64>,
    pub accuracy: Option<f64>,
    pub energy: Option<f64>,
    pub size: Option<f64>,
    pub confidence: Option<f64>,
    /// Worker specific metrics
    #[serde(default)]
    pub extra: serde_json::Value,
    pub collected_at: DateTime<Utc>,
}

impl MeasurementResult {
    /// A successful run that took `time` seconds
    pub fn ok(time: f64) -> Self {
        Self {
            time: Some(time),
            ..Self::with_state(ResultState::Ok)
        }
    }

    /// A run that exceeded its limit
    pub fn timeout() -> Self {
        Self::with_state(ResultState::Timeout)
    }

    /// A run that failed on the worker
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            extra: serde_json::json!({ "error": message.into() }),
            ..Self::with_state(ResultState::Error)
        }
    }

    fn with_state(state: ResultState) -> Self {
        Self {
            state,
            time: None,
            accuracy: None,
            energy: None,
            size: None,
            confidence: None,
            extra: serde_json::Value::Null,
            collected_at: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == ResultState::Ok
    }
}

/// Terminal state reported by a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultState {
    Ok,
    Timeout,
    Error,
}

impl std::fmt::Display for ResultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultState::Ok => write!(f, "OK"),
            ResultState::Timeout => write!(f, "TIMEOUT"),
            ResultState::Error => write!(f, "ERROR"),
        }
    }
}
