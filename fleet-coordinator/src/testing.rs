//! In-memory fakes of the coordinator's capabilities

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use fleet_core::domain::input::Input;
use fleet_core::domain::result::MeasurementResult;
use fleet_core::domain::task::{Configuration, Task};
use fleet_core::dto::measurement::MeasurementRequest;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::capability::{InputSelector, PollStatus, RequestHandle, WorkQueue, WorkerPool};

/// Builds `count` fresh tasks whose configuration records their position
pub fn tasks(count: usize) -> Vec<Task> {
    (0..count)
        .map(|n| Task::new(Configuration::new(serde_json::json!({ "n": n }))))
        .collect()
}

// =============================================================================
// Work queue
// =============================================================================

pub struct FakeQueue {
    pending: Mutex<Vec<Task>>,
    persisted: Mutex<Vec<Input>>,
    reports: Mutex<Vec<(Task, MeasurementResult, Input)>>,
    claims: AtomicUsize,
    fail_claim: bool,
    fail_report_for: Option<Uuid>,
}

impl FakeQueue {
    pub fn new(pending: Vec<Task>) -> Self {
        Self {
            pending: Mutex::new(pending),
            persisted: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
            claims: AtomicUsize::new(0),
            fail_claim: false,
            fail_report_for: None,
        }
    }

    pub fn failing_claim(mut self) -> Self {
        self.fail_claim = true;
        self
    }

    pub fn failing_report_for(mut self, task_id: Uuid) -> Self {
        self.fail_report_for = Some(task_id);
        self
    }

    pub fn persisted(&self) -> Vec<Input> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<(Task, MeasurementResult, Input)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkQueue for FakeQueue {
    async fn claim_batch(&self) -> Result<Vec<Task>> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        if self.fail_claim {
            return Err(anyhow!("queue unavailable"));
        }
        Ok(std::mem::take(&mut *self.pending.lock().unwrap()))
    }

    async fn persist_input(&self, input: &Input) -> Result<()> {
        self.persisted.lock().unwrap().push(input.clone());
        Ok(())
    }

    async fn report(&self, task: &Task, result: &MeasurementResult, input: &Input) -> Result<()> {
        if self.fail_report_for == Some(task.id) {
            return Err(anyhow!("report rejected"));
        }
        self.reports
            .lock()
            .unwrap()
            .push((task.clone(), result.clone(), input.clone()));
        Ok(())
    }
}

// =============================================================================
// Input selector
// =============================================================================

/// Gives every task its own input, tagged with the task id
pub struct FakeSelector {
    delay: Duration,
    fail_on: Option<Uuid>,
    hooked: Mutex<Vec<(Uuid, Uuid)>>,
}

impl FakeSelector {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            fail_on: None,
            hooked: Mutex::new(Vec::new()),
        }
    }

    /// Makes every selection take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, task_id: Uuid) -> Self {
        self.fail_on = Some(task_id);
        self
    }

    /// (task id, input id) pairs seen by the pre-dispatch hook
    pub fn hooked(&self) -> Vec<(Uuid, Uuid)> {
        self.hooked.lock().unwrap().clone()
    }
}

#[async_trait]
impl InputSelector for FakeSelector {
    async fn select(&self, task: &Task) -> Result<Input> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_on == Some(task.id) {
            return Err(anyhow!("no input for task {}", task.id));
        }
        Ok(Input::new(
            "fake",
            serde_json::json!({ "task": task.id.to_string() }),
        ))
    }

    async fn before_dispatch(&self, task: &Task, input: &Input) -> Result<()> {
        self.hooked.lock().unwrap().push((task.id, input.id));
        Ok(())
    }
}

// =============================================================================
// Worker pool
// =============================================================================

/// Scripted behaviour of one request, keyed by batch index
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Pending until the n-th poll, which returns the result
    ReadyAfter(u32),
    /// Every poll fails
    Unreachable,
}

pub struct FakePool {
    steps: HashMap<usize, Step>,
    reverse: bool,
    drop_last: bool,
    reject_submit: bool,
    submitted: Mutex<HashMap<usize, MeasurementRequest>>,
    polls: Mutex<HashMap<usize, u32>>,
    submit_calls: AtomicUsize,
}

impl FakePool {
    /// Every request is ready on its first poll unless scripted otherwise
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            reverse: false,
            drop_last: false,
            reject_submit: false,
            submitted: Mutex::new(HashMap::new()),
            polls: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_step(mut self, index: usize, step: Step) -> Self {
        self.steps.insert(index, step);
        self
    }

    /// Returns handles in reverse submission order
    pub fn reversing_handles(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn dropping_last_handle(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn rejecting_submit(mut self) -> Self {
        self.reject_submit = true;
        self
    }

    /// Handles for `count` requests that were never submitted
    pub fn handles(&self, count: usize) -> Vec<RequestHandle> {
        (0..count).map(handle).collect()
    }

    pub fn polls_of(&self, index: usize) -> u32 {
        self.polls.lock().unwrap().get(&index).copied().unwrap_or(0)
    }

    pub fn total_polls(&self) -> u32 {
        self.polls.lock().unwrap().values().sum()
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn result_for(&self, index: usize) -> MeasurementResult {
        let mut result = MeasurementResult::ok(index as f64);
        result.extra = match self.submitted.lock().unwrap().get(&index) {
            Some(request) => serde_json::json!({
                "configuration": request.configuration.id.to_string(),
                "input": request.input.id.to_string(),
            }),
            None => serde_json::json!({ "index": index }),
        };
        result
    }
}

fn handle(index: usize) -> RequestHandle {
    RequestHandle {
        index,
        worker: 0,
        request_id: format!("req-{}", index),
    }
}

#[async_trait]
impl WorkerPool for FakePool {
    async fn submit(&self, batch: Vec<MeasurementRequest>) -> Result<Vec<RequestHandle>> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_submit {
            return Err(anyhow!("pool rejected batch"));
        }

        let mut handles: Vec<RequestHandle> = (0..batch.len()).map(handle).collect();
        self.submitted
            .lock()
            .unwrap()
            .extend(batch.into_iter().enumerate());

        if self.reverse {
            handles.reverse();
        }
        if self.drop_last {
            handles.pop();
        }
        Ok(handles)
    }

    async fn poll(&self, handle: &RequestHandle) -> Result<PollStatus> {
        let count = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(handle.index).or_insert(0);
            *count += 1;
            *count
        };

        match self.steps.get(&handle.index).copied().unwrap_or(Step::ReadyAfter(1)) {
            Step::Unreachable => Err(anyhow!("connection to worker lost")),
            Step::ReadyAfter(n) if count >= n => {
                Ok(PollStatus::Ready(self.result_for(handle.index)))
            }
            Step::ReadyAfter(_) => Ok(PollStatus::Pending),
        }
    }

    fn size(&self) -> usize {
        1
    }
}
