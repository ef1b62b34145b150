//! Worker pool capability
//!
//! A pool of already connected measurement workers. Submissions are
//! asynchronous: `submit` returns handles right away and `poll` checks on a
//! handle without waiting for it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fleet_client::WorkerClient;
use fleet_core::domain::result::MeasurementResult;
use fleet_core::dto::measurement::{
    MeasurementInterface, MeasurementRequest, PollResponse, SubmitBatch,
};
use std::time::Duration;
use tracing::{debug, info};

/// An in-flight measurement
///
/// `index` is the position of the originating request in the submitted batch
/// and is the only key used to correlate a completion with its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    pub index: usize,
    /// Slot of the worker running the measurement
    pub worker: usize,
    /// Identifier assigned by the worker
    pub request_id: String,
}

/// Answer to a non-blocking poll
#[derive(Debug, Clone)]
pub enum PollStatus {
    Ready(MeasurementResult),
    Pending,
}

/// Remote workers that run measurements
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Submits a whole batch at once
    ///
    /// Returns one handle per request. Handles may come back in any order;
    /// each carries the index of the request it belongs to.
    async fn submit(&self, batch: Vec<MeasurementRequest>) -> Result<Vec<RequestHandle>>;

    /// Checks on a submitted request without blocking
    ///
    /// An error means the worker behind the handle can no longer be reached.
    async fn poll(&self, handle: &RequestHandle) -> Result<PollStatus>;

    /// Number of workers in the pool
    fn size(&self) -> usize;
}

/// Settings for the HTTP worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Base URLs of the workers, one per instance
    pub endpoints: Vec<String>,

    /// Measurement interface every worker should load
    pub interface: MeasurementInterface,

    /// Timeout applied to every HTTP call to a worker
    pub request_timeout: Duration,
}

/// HTTP implementation of WorkerPool
///
/// Requests are spread over the workers by index modulo pool size and each
/// worker receives its share in one submission.
pub struct HttpWorkerPool {
    workers: Vec<WorkerClient>,
    interface: MeasurementInterface,
}

impl HttpWorkerPool {
    /// Creates a pool from its configuration
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        if config.endpoints.is_empty() {
            anyhow::bail!("worker pool needs at least one endpoint");
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client for workers")?;

        let workers = config
            .endpoints
            .iter()
            .map(|endpoint| WorkerClient::with_client(endpoint.as_str(), http.clone()))
            .collect();

        Ok(Self {
            workers,
            interface: config.interface,
        })
    }

    /// Fails unless every worker answers its health check
    pub async fn check_health(&self) -> Result<()> {
        for worker in &self.workers {
            worker
                .health()
                .await
                .with_context(|| format!("Worker {} is not healthy", worker.base_url()))?;
        }

        info!("All {} worker(s) are healthy", self.workers.len());
        Ok(())
    }

    fn worker(&self, slot: usize) -> Result<&WorkerClient> {
        self.workers
            .get(slot)
            .with_context(|| format!("No worker in slot {}", slot))
    }
}

/// Splits a batch over `slots` workers, keeping each request's batch index
fn assign(batch: Vec<MeasurementRequest>, slots: usize) -> Vec<Vec<(usize, MeasurementRequest)>> {
    let mut assigned: Vec<Vec<(usize, MeasurementRequest)>> =
        (0..slots).map(|_| Vec::new()).collect();

    for (index, request) in batch.into_iter().enumerate() {
        assigned[index % slots].push((index, request));
    }

    assigned
}

#[async_trait]
impl WorkerPool for HttpWorkerPool {
    async fn submit(&self, batch: Vec<MeasurementRequest>) -> Result<Vec<RequestHandle>> {
        let mut handles = Vec::with_capacity(batch.len());

        for (slot, share) in assign(batch, self.workers.len()).into_iter().enumerate() {
            if share.is_empty() {
                continue;
            }

            let worker = self.worker(slot)?;
            let (indices, requests): (Vec<usize>, Vec<MeasurementRequest>) =
                share.into_iter().unzip();

            debug!("Submitting {} request(s) to {}", requests.len(), worker.base_url());

            let submitted = worker
                .submit(&SubmitBatch {
                    interface: self.interface.clone(),
                    requests,
                })
                .await
                .with_context(|| format!("Failed to submit to worker {}", worker.base_url()))?;

            handles.extend(indices.into_iter().zip(submitted).map(|(index, ack)| RequestHandle {
                index,
                worker: slot,
                request_id: ack.request_id,
            }));
        }

        Ok(handles)
    }

    async fn poll(&self, handle: &RequestHandle) -> Result<PollStatus> {
        let worker = self.worker(handle.worker)?;

        let response = worker
            .poll(&handle.request_id)
            .await
            .with_context(|| format!("Worker {} unreachable", worker.base_url()))?;

        Ok(match response {
            PollResponse::Pending => PollStatus::Pending,
            PollResponse::Complete { result } => PollStatus::Ready(result),
        })
    }

    fn size(&self) -> usize {
        self.workers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::domain::input::Input;
    use fleet_core::domain::task::Configuration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(n: i64) -> MeasurementRequest {
        MeasurementRequest {
            configuration: Configuration::new(serde_json::json!({ "n": n })),
            input: Input::new("fixed", serde_json::Value::Null),
            limit_seconds: 10.0,
        }
    }

    fn config(endpoints: &[&str]) -> WorkerPoolConfig {
        WorkerPoolConfig {
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            interface: MeasurementInterface::default(),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_assign_round_robin_keeps_indices() {
        let batch = (0..5).map(request).collect();
        let assigned = assign(batch, 2);

        let indices: Vec<Vec<usize>> = assigned
            .iter()
            .map(|share| share.iter().map(|(i, _)| *i).collect())
            .collect();
        assert_eq!(indices, vec![vec![0, 2, 4], vec![1, 3]]);
        assert_eq!(assigned[1][1].1.configuration.data["n"], 3);
    }

    #[test]
    fn test_assign_more_slots_than_requests() {
        let assigned = assign(vec![request(0)], 3);
        assert_eq!(assigned.len(), 3);
        assert_eq!(assigned[0].len(), 1);
        assert!(assigned[1].is_empty() && assigned[2].is_empty());
    }

    #[test]
    fn test_pool_requires_endpoints() {
        assert!(HttpWorkerPool::new(config(&[])).is_err());

        let pool = HttpWorkerPool::new(config(&["http://a:9000", "http://b:9000/"])).unwrap();
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.worker(1).unwrap().base_url(), "http://b:9000");
        assert!(pool.worker(2).is_err());
    }

    async fn worker_acking(ids: &[&str]) -> MockServer {
        let server = MockServer::start().await;
        let acks: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({ "request_id": id }))
            .collect();

        Mock::given(method("POST"))
            .and(path("/api/measurements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(acks))
            .expect(1)
            .mount(&server)
            .await;

        server
    }

    #[tokio::test]
    async fn test_submit_pairs_acks_with_indices_per_worker() {
        let first = worker_acking(&["a-0", "a-2"]).await;
        let second = worker_acking(&["b-1"]).await;
        let pool = HttpWorkerPool::new(config(&[&first.uri(), &second.uri()])).unwrap();

        let handles = pool.submit((0..3).map(request).collect()).await.unwrap();

        let handle = |index: usize, worker: usize, id: &str| RequestHandle {
            index,
            worker,
            request_id: id.to_string(),
        };
        assert_eq!(
            handles,
            vec![handle(0, 0, "a-0"), handle(2, 0, "a-2"), handle(1, 1, "b-1")]
        );
    }

    #[tokio::test]
    async fn test_submit_skips_workers_without_share() {
        let first = worker_acking(&["a-0"]).await;
        let idle = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&idle)
            .await;
        let pool = HttpWorkerPool::new(config(&[&first.uri(), &idle.uri()])).unwrap();

        let handles = pool.submit(vec![request(0)]).await.unwrap();

        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].worker, 0);
    }

    #[tokio::test]
    async fn test_submit_fails_when_a_worker_rejects() {
        let first = worker_acking(&["a-0"]).await;
        let broken = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/measurements"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&broken)
            .await;
        let pool = HttpWorkerPool::new(config(&[&first.uri(), &broken.uri()])).unwrap();

        assert!(pool.submit((0..2).map(request).collect()).await.is_err());
    }

    #[tokio::test]
    async fn test_poll_maps_worker_responses() {
        let worker = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/measurements/waiting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "pending",
            })))
            .mount(&worker)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/measurements/done"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "complete",
                "result": MeasurementResult::ok(2.5),
            })))
            .mount(&worker)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/measurements/lost"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&worker)
            .await;
        let pool = HttpWorkerPool::new(config(&[&worker.uri()])).unwrap();

        let handle = |id: &str| RequestHandle {
            index: 0,
            worker: 0,
            request_id: id.to_string(),
        };

        assert!(matches!(
            pool.poll(&handle("waiting")).await.unwrap(),
            PollStatus::Pending
        ));
        match pool.poll(&handle("done")).await.unwrap() {
            PollStatus::Ready(result) => {
                assert!(result.is_ok());
                assert_eq!(result.time, Some(2.5));
            }
            PollStatus::Pending => panic!("expected a result"),
        }
        assert!(pool.poll(&handle("lost")).await.is_err());
    }
}
