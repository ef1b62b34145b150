//! Core domain types
//!
//! These types describe the entities that flow through a measurement cycle.
//! They are owned by the work queue and only borrowed (or lightly mutated)
//! by the coordinator while a cycle runs.

pub mod input;
pub mod result;
pub mod task;
