//! Fleet HTTP Client
//!
//! Type-safe HTTP clients for the two remote services the coordinator talks to:
//! the work queue that owns tasks, inputs and results, and the measurement
//! workers that run configurations.
//!
//! # Example
//!
//! ```no_run
//! use fleet_client::WorkQueueClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let queue = WorkQueueClient::new("http://localhost:8080");
//!
//!     let tasks = queue.claim_batch("coordinator-1", 8).await?;
//!     println!("Claimed {} task(s)", tasks.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod measurements;
mod tasks;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the work queue API
///
/// Covers the task lifecycle as seen by a coordinator:
/// - Claiming batches of pending tasks
/// - Persisting selected inputs
/// - Reporting results
#[derive(Debug, Clone)]
pub struct WorkQueueClient {
    /// Base URL of the work queue (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl WorkQueueClient {
    /// Create a new work queue client
    ///
    /// # Example
    /// ```
    /// use fleet_client::WorkQueueClient;
    ///
    /// let client = WorkQueueClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new work queue client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            client,
        }
    }

    /// Get the base URL of the work queue
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// HTTP client for a single measurement worker
#[derive(Debug, Clone)]
pub struct WorkerClient {
    /// Base URL of the worker (e.g., "http://10.0.0.4:9000")
    base_url: String,
    client: Client,
}

impl WorkerClient {
    /// Create a new worker client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new worker client sharing a configured HTTP client
    ///
    /// # Example
    /// ```
    /// use fleet_client::WorkerClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let worker = WorkerClient::with_client("http://10.0.0.4:9000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            client,
        }
    }

    /// Get the base URL of the worker
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize the JSON body of a successful response
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Check the status code of a response that carries no body
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}
