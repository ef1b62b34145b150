//! Fleet Core
//!
//! Core types shared by the Fleet measurement coordinator and its HTTP client.
//!
//! This crate contains:
//! - Domain types: tasks awaiting measurement, inputs and measurement results
//! - DTOs: request and response bodies exchanged with the work queue and workers

pub mod domain;
pub mod dto;
