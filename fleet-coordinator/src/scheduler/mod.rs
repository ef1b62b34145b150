//! Scheduler layer for the coordinator
//!
//! This layer moves claimed tasks through one measurement cycle:
//! the dispatcher prepares and submits them, the poller waits for
//! completions, and the cycle controller reports each result as it
//! arrives. The driver repeats cycles on an interval.

pub mod cycle;
pub mod dispatcher;
pub mod driver;
pub mod poller;
pub mod strategy;

pub use cycle::CycleController;
pub use driver::CycleDriver;
pub use poller::Poller;
pub use strategy::WorkerPoolStrategy;
