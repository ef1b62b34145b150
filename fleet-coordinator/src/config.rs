//! Coordinator configuration
//!
//! Defines every tunable of the coordinator: where the work queue and the
//! workers live, how much work a cycle claims, and how limits and polling
//! are paced. Values come from command-line flags with environment fallbacks.

use clap::Parser;
use fleet_core::dto::measurement::MeasurementInterface;
use std::time::Duration;

use crate::capability::WorkerPoolConfig;

/// Command-line flags
#[derive(Debug, Parser)]
#[command(name = "fleet-coordinator")]
#[command(about = "Dispatches pending measurements to a pool of remote workers", long_about = None)]
pub struct Cli {
    /// Identity under which tasks are claimed (random when omitted)
    #[arg(long, env = "FLEET_COORDINATOR_ID")]
    pub coordinator_id: Option<String>,

    /// Work queue base URL
    #[arg(long, env = "FLEET_QUEUE_URL", default_value = "http://localhost:8080")]
    pub queue_url: String,

    /// Worker base URLs, one per instance
    #[arg(long = "worker-url", env = "FLEET_WORKER_URLS", value_delimiter = ',', required = true)]
    pub worker_urls: Vec<String>,

    /// Maximum number of tasks claimed per cycle
    #[arg(long, env = "FLEET_BATCH_SIZE", default_value_t = 8)]
    pub batch_size: usize,

    /// Time budget of a cycle in seconds
    #[arg(long, env = "FLEET_TIME_LIMIT", default_value_t = 3600)]
    pub time_limit: u64,

    /// Smallest limit ever given to a task, in seconds
    #[arg(long, env = "FLEET_MIN_LIMIT", default_value_t = 1)]
    pub min_limit: u64,

    /// Seconds between the start of two cycles
    #[arg(long, env = "FLEET_CYCLE_INTERVAL", default_value_t = 5)]
    pub cycle_interval: u64,

    /// Pause in milliseconds after a poll sweep that resolved nothing
    #[arg(long, env = "FLEET_SWEEP_DELAY_MS", default_value_t = 100)]
    pub sweep_delay_ms: u64,

    /// Timeout in seconds for every HTTP call to a worker
    #[arg(long, env = "FLEET_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    /// Repository holding the tuner
    #[arg(long, env = "FLEET_REPO", default_value = "")]
    pub repo: String,

    /// Path of the tuner inside the repository
    #[arg(long, env = "FLEET_INTERFACE_PATH", default_value = "")]
    pub interface_path: String,

    /// Name of the measurement interface
    #[arg(long, env = "FLEET_INTERFACE_NAME", default_value = "")]
    pub interface_name: String,

    /// Input class used by the fixed input selector
    #[arg(long, env = "FLEET_INPUT_CLASS", default_value = "fixed")]
    pub input_class: String,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity under which tasks are claimed
    pub coordinator_id: String,

    /// Work queue base URL (e.g., "http://localhost:8080")
    pub queue_url: String,

    /// Worker base URLs; their count is the pool size
    pub worker_urls: Vec<String>,

    /// Maximum number of tasks claimed per cycle
    pub batch_size: usize,

    /// Time budget shared by the tasks of one cycle
    pub time_limit: Duration,

    /// Floor for every task limit
    pub min_limit: Duration,

    /// How often a new cycle starts
    pub cycle_interval: Duration,

    /// Pause after an idle poll sweep
    pub sweep_delay: Duration,

    /// Timeout for worker HTTP calls
    pub http_timeout: Duration,

    /// Measurement interface sent along with every request
    pub interface: MeasurementInterface,

    /// Input class for the fixed input selector
    pub input_class: String,
}

impl Config {
    /// Creates a configuration with defaults for everything but the endpoints
    pub fn new(queue_url: String, worker_urls: Vec<String>) -> Self {
        Self {
            coordinator_id: uuid::Uuid::new_v4().to_string(),
            queue_url,
            worker_urls,
            batch_size: 8,
            time_limit: Duration::from_secs(3600),
            min_limit: Duration::from_secs(1),
            cycle_interval: Duration::from_secs(5),
            sweep_delay: Duration::from_millis(100),
            http_timeout: Duration::from_secs(30),
            interface: MeasurementInterface::default(),
            input_class: "fixed".to_string(),
        }
    }

    /// Settings for the HTTP worker pool
    pub fn worker_pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            endpoints: self.worker_urls.clone(),
            interface: self.interface.clone(),
            request_timeout: self.http_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.coordinator_id.is_empty() {
            anyhow::bail!("coordinator_id cannot be empty");
        }

        check_url("queue_url", &self.queue_url)?;

        if self.worker_urls.is_empty() {
            anyhow::bail!("at least one worker URL is required");
        }

        for url in &self.worker_urls {
            check_url("worker URL", url)?;
        }

        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }

        if self.min_limit > self.time_limit {
            anyhow::bail!("min_limit cannot exceed time_limit");
        }

        if self.cycle_interval.is_zero() {
            anyhow::bail!("cycle_interval must be greater than 0");
        }

        Ok(())
    }
}

fn check_url(what: &str, url: &str) -> anyhow::Result<()> {
    if url.is_empty() {
        anyhow::bail!("{} cannot be empty", what);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://: {}", what, url);
    }

    Ok(())
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let mut config = Config::new(cli.queue_url, cli.worker_urls);

        if let Some(id) = cli.coordinator_id {
            config.coordinator_id = id;
        }
        config.batch_size = cli.batch_size;
        config.time_limit = Duration::from_secs(cli.time_limit);
        config.min_limit = Duration::from_secs(cli.min_limit);
        config.cycle_interval = Duration::from_secs(cli.cycle_interval);
        config.sweep_delay = Duration::from_millis(cli.sweep_delay_ms);
        config.http_timeout = Duration::from_secs(cli.http_timeout);
        config.interface = MeasurementInterface {
            repo: cli.repo,
            path: cli.interface_path,
            name: cli.interface_name,
        };
        config.input_class = cli.input_class;

        config
    }
}
