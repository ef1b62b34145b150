//! Capability layer
//!
//! The coordinator never talks to the outside world directly. It consumes
//! three capabilities through traits:
//! - `WorkQueue`: claims tasks, persists inputs, takes reports
//! - `InputSelector`: picks the input a task is measured on
//! - `WorkerPool`: runs measurements remotely and answers non-blocking polls
//!
//! Each trait ships with the HTTP (or fixed) implementation used by the binary;
//! tests plug in in-memory fakes.

mod input;
mod queue;
mod workers;

// Re-export traits
pub use input::InputSelector;
pub use queue::WorkQueue;
pub use workers::{PollStatus, RequestHandle, WorkerPool};

// Re-export implementations
pub use input::FixedInputSelector;
pub use queue::HttpWorkQueue;
pub use workers::{HttpWorkerPool, WorkerPoolConfig};
