//! Fleet Coordinator
//!
//! Claims pending measurement tasks from the work queue, ships them to a pool
//! of remote workers and reports every result back exactly once.
//!
//! Architecture:
//! - Configuration: flags with environment fallbacks
//! - Capabilities: work queue, input selection and worker pool behind traits
//! - Services: limit policy
//! - Scheduler: dispatch, round-robin polling, reporting and the cycle loop

mod capability;
mod config;
mod error;
mod scheduler;
mod service;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::capability::{FixedInputSelector, HttpWorkQueue, HttpWorkerPool};
use crate::config::{Cli, Config};
use crate::scheduler::{CycleController, CycleDriver, Poller, WorkerPoolStrategy};
use crate::service::BudgetLimitPolicy;
use fleet_client::WorkQueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_coordinator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fleet Coordinator");

    let cli = Cli::parse();
    let once = cli.once;
    let config = Config::from(cli);
    config.validate()?;

    info!(
        "Loaded configuration: coordinator_id={}, queue_url={}, workers={}, batch_size={}",
        config.coordinator_id,
        config.queue_url,
        config.worker_urls.len(),
        config.batch_size
    );

    let pool = Arc::new(
        HttpWorkerPool::new(config.worker_pool_config()).context("Failed to set up worker pool")?,
    );
    wait_for_workers(&pool).await?;

    let queue = Arc::new(HttpWorkQueue::new(
        WorkQueueClient::new(config.queue_url.clone()),
        config.coordinator_id.clone(),
        config.batch_size,
    ));
    let selector = Arc::new(FixedInputSelector::new(
        config.input_class.clone(),
        serde_json::Value::Null,
    ));
    let limits = Arc::new(BudgetLimitPolicy::new(config.time_limit, config.min_limit));
    let strategy = Arc::new(WorkerPoolStrategy::new(pool, Poller::new(config.sweep_delay)));

    let controller = CycleController::new(queue, selector, limits, strategy);
    let driver = CycleDriver::new(controller, config.cycle_interval);

    info!("Coordinator initialized successfully");

    if once {
        let outcome = driver.run_once().await?;
        info!(
            "Single cycle done: {}/{} task(s) reported",
            outcome.reported.len(),
            outcome.claimed
        );
        return Ok(());
    }

    if let Err(e) = driver.run().await {
        error!("Driver error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Waits until every worker answers its health check, with exponential backoff
///
/// Workers are usually started alongside the coordinator and may need a
/// moment before they accept requests.
async fn wait_for_workers(pool: &HttpWorkerPool) -> Result<()> {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match pool.check_health().await {
            Ok(()) => {
                if attempt > 1 {
                    info!("Workers ready after {} attempt(s)", attempt);
                }
                return Ok(());
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!("Workers not ready after {} attempts", MAX_RETRIES);
                    return Err(e.context("Worker pool never became healthy"));
                }

                warn!(
                    "Worker pool not ready (attempt {}/{}): {:#}",
                    attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
