//! Task domain types
//!
//! A task (a "desired result") is a candidate configuration waiting for a
//! measurement outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A candidate configuration awaiting measurement
///
/// Created by the work queue, claimed by exactly one coordinator cycle and
/// resolved by a single report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub configuration: Configuration,
    /// Time limit in seconds, set by the coordinator at dispatch time
    pub limit_seconds: Option<f64>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: i32,
    pub requested_at: DateTime<Utc>,
}

impl Task {
    /// Creates a freshly requested task for a configuration
    pub fn new(configuration: Configuration) -> Self {
        Self {
            id: Uuid::new_v4(),
            configuration,
            limit_seconds: None,
            status: TaskStatus::Requested,
            priority: 0,
            requested_at: Utc::now(),
        }
    }

    /// Returns the dispatch limit, if one has been assigned
    ///
    /// Negative, NaN and out-of-range values read as no limit.
    pub fn limit(&self) -> Option<Duration> {
        self.limit_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Assigns the dispatch limit
    pub fn set_limit(&mut self, limit: Duration) {
        self.limit_seconds = Some(limit.as_secs_f64());
    }
}

/// A configuration point of the search space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: Uuid,
    /// Opaque parameter assignment, interpreted only by the workers
    pub data: serde_json::Value,
}

impl Configuration {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
        }
    }
}

/// Lifecycle status of a task in the work queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Unknown,
    Requested,
    Running,
    Complete,
    Aborted,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Unknown => write!(f, "Unknown"),
            TaskStatus::Requested => write!(f, "Requested"),
            TaskStatus::Running => write!(f, "Running"),
            TaskStatus::Complete => write!(f, "Complete"),
            TaskStatus::Aborted => write!(f, "Aborted"),
        }
    }
}
