#![allow(dead_code)]

//! Polling Client Protocol — the caller-side contract for waiting on a
//! match task.
//!
//! The client polls the status endpoint on a fixed interval up to a hard
//! attempt cap (`Timeout`). A transport-level poll error does not end the
//! loop: it retries with exponential backoff and aborts with
//! `ConnectionLost` only after a run of *consecutive* errors, since the
//! server state is otherwise unknowable. A successful poll resets the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::scoring::MatchResult;

/// Client-side view of a task snapshot as returned by
/// `GET /task-status/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub status: String,
    pub progress: u8,
    #[serde(default)]
    pub result: Option<Vec<MatchResult>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }
}

/// One status fetch. `NotFound` is terminal for the poll loop; `Transport`
/// feeds the consecutive-error backoff.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("task not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Abstract status endpoint, so the protocol is testable without a server.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, task_id: Uuid) -> Result<TaskSnapshot, FetchError>;
}

/// Polling policy. The reference values from the protocol are defaults;
/// every knob is configurable.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 60,
            backoff_base: Duration::from_secs(3),
            backoff_cap: Duration::from_secs(10),
            max_consecutive_errors: 3,
        }
    }
}

/// `min(base · 1.5^(consecutive_errors - 1), cap)`
fn backoff_delay(config: &PollConfig, consecutive_errors: u32) -> Duration {
    let exp = consecutive_errors.saturating_sub(1).min(30);
    let delay = config.backoff_base.mul_f64(1.5f64.powi(exp as i32));
    delay.min(config.backoff_cap)
}

/// Polls until the task reaches a terminal state or the policy gives up.
///
/// Every poll call consumes an attempt, successful or not; the
/// consecutive-error cap is the only early-abort path.
pub async fn poll_until_terminal(
    source: &dyn StatusSource,
    task_id: Uuid,
    config: &PollConfig,
) -> Result<TaskSnapshot, MatchError> {
    let mut consecutive_errors = 0u32;

    for attempt in 1..=config.max_attempts {
        match source.fetch(task_id).await {
            Ok(snapshot) => {
                consecutive_errors = 0;
                if snapshot.is_terminal() {
                    debug!(
                        "Task {task_id} reached '{}' after {attempt} polls",
                        snapshot.status
                    );
                    return Ok(snapshot);
                }
                tokio::time::sleep(config.interval).await;
            }
            Err(FetchError::NotFound) => return Err(MatchError::NotFound(task_id)),
            Err(FetchError::Transport(e)) => {
                consecutive_errors += 1;
                warn!(
                    "Poll {attempt} for task {task_id} failed ({consecutive_errors} in a row): {e}"
                );
                if consecutive_errors >= config.max_consecutive_errors {
                    return Err(MatchError::ConnectionLost { consecutive_errors });
                }
                tokio::time::sleep(backoff_delay(config, consecutive_errors)).await;
            }
        }
    }

    Err(MatchError::Timeout {
        attempts: config.max_attempts,
    })
}

/// HTTP implementation of `StatusSource` against the service's own API.
pub struct HttpStatusSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self, task_id: Uuid) -> Result<TaskSnapshot, FetchError> {
        let url = format!(
            "{}/task-status/{task_id}",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<TaskSnapshot>()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Convenience wrapper bundling a source with its policy.
pub struct PollClient {
    source: Arc<dyn StatusSource>,
    config: PollConfig,
}

impl PollClient {
    pub fn new(source: Arc<dyn StatusSource>, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn for_server(base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpStatusSource::new(base_url)), PollConfig::default())
    }

    pub async fn wait(&self, task_id: Uuid) -> Result<TaskSnapshot, MatchError> {
        poll_until_terminal(self.source.as_ref(), task_id, &self.config).await
    }
}
