//! Cycle driver
//!
//! Runs measurement cycles on an interval until the process is asked to
//! stop. A failed cycle is logged and the next one starts on schedule;
//! there is no retry inside a cycle.

use anyhow::Result;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::error::CycleError;
use crate::scheduler::cycle::{CycleController, CycleOutcome};

/// Drives the cycle controller repeatedly
pub struct CycleDriver {
    controller: CycleController,
    interval: Duration,
}

impl CycleDriver {
    /// Creates a new driver
    pub fn new(controller: CycleController, interval: Duration) -> Self {
        Self {
            controller,
            interval,
        }
    }

    /// Starts the cycle loop
    ///
    /// Ctrl-C is only honoured between cycles; a running cycle always
    /// finishes first.
    pub async fn run(&self) -> Result<()> {
        info!("Starting cycle loop (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping cycle loop");
                    return Ok(());
                }
            }

            debug!("Starting measurement cycle");

            if let Err(e) = self.run_once().await {
                error!("Cycle failed: {}", e);
            }
        }
    }

    /// Runs a single cycle and logs what it left behind
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        match self.controller.run_cycle().await {
            Ok(outcome) => {
                log_leftovers(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                let stranded = e.claimed_tasks();
                if !stranded.is_empty() {
                    warn!(
                        "{} claimed task(s) were not measured: {:?}",
                        stranded.len(),
                        stranded.iter().map(|t| t.id).collect::<Vec<_>>()
                    );
                }
                Err(e)
            }
        }
    }
}

fn log_leftovers(outcome: &CycleOutcome) {
    for reported in &outcome.reported {
        debug!(
            "Task {} on input {}: {}",
            reported.task.id, reported.input.id, reported.result.state
        );
    }

    for abandoned in &outcome.abandoned {
        warn!(
            "Task {} (input {}) abandoned, needs requeueing: {:#}",
            abandoned.task.id, abandoned.input.id, abandoned.error
        );
    }

    for unreported in &outcome.unreported {
        warn!(
            "Task {} measured on input {} ({}) but not reported: {:#}",
            unreported.task.id, unreported.input.id, unreported.result.state, unreported.error
        );
    }

    if !outcome.is_complete() {
        warn!(
            "Only {}/{} task(s) reported this cycle",
            outcome.reported.len(),
            outcome.claimed
        );
    } else if outcome.claimed > 0 {
        info!(
            "Reported {}/{} task(s) this cycle",
            outcome.reported.len(),
            outcome.claimed
        );
    }
}
