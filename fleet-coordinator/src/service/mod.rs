//! Service layer
//!
//! Policies the scheduler consults while preparing a batch.
//!
//! All services are trait-based to enable testing and dependency injection.

mod limit;

// Re-export traits
pub use limit::LimitPolicy;

// Re-export implementations
pub use limit::BudgetLimitPolicy;
