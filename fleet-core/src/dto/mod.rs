//! Data Transfer Objects for inter-service communication
//!
//! Request and response bodies exchanged between the coordinator, the work
//! queue service and the measurement workers.

pub mod measurement;
pub mod task;
