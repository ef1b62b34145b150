//! Input domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Data that accompanies a task for one measurement attempt
///
/// Persisted by the work queue as soon as it is selected, so it can be found
/// even if the coordinator dies before reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: Uuid,
    /// Groups inputs that are interchangeable for measurement purposes
    pub input_class: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Input {
    pub fn new(input_class: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_class: input_class.into(),
            data,
            created_at: Utc::now(),
        }
    }
}
