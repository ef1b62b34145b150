//! Input selection capability

use anyhow::Result;
use async_trait::async_trait;
use fleet_core::domain::input::Input;
use fleet_core::domain::task::Task;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use tracing::debug;

/// Policy deciding which input accompanies a task
#[async_trait]
pub trait InputSelector: Send + Sync {
    /// Picks the input for one measurement attempt of `task`
    async fn select(&self, task: &Task) -> Result<Input>;

    /// Last hook before the task is sent to a worker
    ///
    /// Called after the input has been persisted. The default does nothing.
    async fn before_dispatch(&self, _task: &Task, _input: &Input) -> Result<()> {
        Ok(())
    }
}

/// Measures every task on the same input
///
/// The input is created on first use and reused for the lifetime of the
/// selector.
pub struct FixedInputSelector {
    input_class: String,
    data: JsonValue,
    input: OnceLock<Input>,
}

impl FixedInputSelector {
    pub fn new(input_class: impl Into<String>, data: JsonValue) -> Self {
        Self {
            input_class: input_class.into(),
            data,
            input: OnceLock::new(),
        }
    }
}

#[async_trait]
impl InputSelector for FixedInputSelector {
    async fn select(&self, _task: &Task) -> Result<Input> {
        let input = self
            .input
            .get_or_init(|| Input::new(self.input_class.clone(), self.data.clone()));
        Ok(input.clone())
    }

    async fn before_dispatch(&self, task: &Task, input: &Input) -> Result<()> {
        debug!("Task {} staged on fixed input {}", task.id, input.id);
        Ok(())
    }
}
