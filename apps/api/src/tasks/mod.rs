//! Task Orchestrator — owns the task lifecycle and the work queue.
//!
//! States: `queued → processing → {completed | failed}`. Terminal states
//! are immutable; status and result/error become visible together under
//! one write-lock critical section, so a poller never observes
//! `completed` with a missing result.

pub mod worker;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::normalizer::ResumeInput;
use crate::matching::scoring::MatchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// One asynchronous matching run. Mutated only by the owning worker via
/// the store; immutable once terminal; swept after the retention window.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub status: TaskStatus,
    pub progress: u8,
    pub result: Option<Vec<MatchResult>>,
    pub error: Option<String>,
    #[serde(skip)]
    finished_at: Option<DateTime<Utc>>,
}

/// In-memory task registry. Lock scope is always a single non-awaiting
/// critical section, so a plain `std::sync` lock is enough.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh `queued` task and returns its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let task = Task {
            id,
            status: TaskStatus::Queued,
            progress: 0,
            result: None,
            error: None,
            finished_at: None,
        };
        self.tasks.write().unwrap().insert(id, task);
        id
    }

    /// Snapshot by id, or `NotFound` if unknown or already swept.
    pub fn get(&self, id: Uuid) -> Result<Task, MatchError> {
        self.tasks
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(MatchError::NotFound(id))
    }

    pub fn mark_processing(&self, id: Uuid) {
        let mut tasks = self.tasks.write().unwrap();
        if let Some(task) = tasks.get_mut(&id) {
            if task.status == TaskStatus::Queued {
                task.status = TaskStatus::Processing;
            }
        }
    }

    /// Monotonic progress update; lower values and terminal tasks are
    /// ignored.
    pub fn update_progress(&self, id: Uuid, progress: u8) {
        let mut tasks = self.tasks.write().unwrap();
        if let Some(task) = tasks.get_mut(&id) {
            if !task.status.is_terminal() && progress > task.progress {
                task.progress = progress.min(100);
            }
        }
    }

    /// Atomically transitions to `completed` with the ranked results.
    pub fn complete(&self, id: Uuid, results: Vec<MatchResult>) {
        let mut tasks = self.tasks.write().unwrap();
        if let Some(task) = tasks.get_mut(&id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Completed;
            task.progress = 100;
            task.result = Some(results);
            task.finished_at = Some(Utc::now());
        }
    }

    /// Atomically transitions to `failed` with the error message.
    pub fn fail(&self, id: Uuid, error: String) {
        let mut tasks = self.tasks.write().unwrap();
        if let Some(task) = tasks.get_mut(&id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Failed;
            task.error = Some(error);
            task.finished_at = Some(Utc::now());
        }
    }

    /// Removes terminal tasks older than the retention window. Returns the
    /// number of tasks removed.
    pub fn sweep_expired(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero());
        let mut tasks = self.tasks.write().unwrap();
        let before = tasks.len();
        tasks.retain(|_, task| match task.finished_at {
            Some(finished) => finished > cutoff,
            None => true,
        });
        before - tasks.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tasks.read().unwrap().len()
    }
}

/// A claimed unit of work: the task id plus the validated resume input.
#[derive(Debug)]
pub struct WorkItem {
    pub task_id: Uuid,
    pub input: ResumeInput,
}

/// Front door for task submission and status queries. Submission never
/// blocks on parsing or scoring; it only registers the task and enqueues
/// a work item for the pool.
#[derive(Clone)]
pub struct Orchestrator {
    store: TaskStore,
    queue: mpsc::UnboundedSender<WorkItem>,
}

impl Orchestrator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkItem>) {
        let (queue, receiver) = mpsc::unbounded_channel();
        (
            Self {
                store: TaskStore::new(),
                queue,
            },
            receiver,
        )
    }

    /// Registers a task for already-validated input and hands it to the
    /// worker pool. Returns the task id immediately.
    pub fn submit(&self, input: ResumeInput) -> Result<Uuid, MatchError> {
        let id = self.store.create();
        if self
            .queue
            .send(WorkItem {
                task_id: id,
                input,
            })
            .is_err()
        {
            // Worker pool is gone; the task can never run.
            self.store
                .fail(id, "worker pool is not accepting tasks".to_string());
        }
        Ok(id)
    }

    pub fn status(&self, id: Uuid) -> Result<Task, MatchError> {
        self.store.get(id)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Background loop that reclaims terminal tasks past the retention
    /// window.
    pub fn spawn_retention_sweeper(
        &self,
        retention: Duration,
        sweep_interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.sweep_expired(retention);
                if removed > 0 {
                    tracing::debug!("Retention sweep removed {removed} tasks");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_queued_at_zero_progress() {
        let store = TaskStore::new();
        let id = store.create();
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.progress, 0);
        assert!(task.result.is_none());
        assert!(task.error.is_none());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = TaskStore::new();
        let err = store.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, MatchError::NotFound(_)));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let store = TaskStore::new();
        let id = store.create();
        store.mark_processing(id);

        store.update_progress(id, 40);
        store.update_progress(id, 20); // ignored
        assert_eq!(store.get(id).unwrap().progress, 40);

        store.update_progress(id, 90);
        assert_eq!(store.get(id).unwrap().progress, 90);
    }

    #[test]
    fn test_completed_is_visible_with_result_and_full_progress() {
        let store = TaskStore::new();
        let id = store.create();
        store.mark_processing(id);
        store.complete(id, vec![]);

        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.result.is_some(), "completed task must carry a result");
    }

    #[test]
    fn test_terminal_tasks_are_immutable() {
        let store = TaskStore::new();
        let id = store.create();
        store.fail(id, "resume could not be parsed".to_string());

        store.update_progress(id, 99);
        store.complete(id, vec![]);
        store.mark_processing(id);

        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.progress, 0);
        assert_eq!(task.error.as_deref(), Some("resume could not be parsed"));
        assert!(task.result.is_none());
    }

    #[test]
    fn test_sweep_removes_only_expired_terminal_tasks() {
        let store = TaskStore::new();
        let done = store.create();
        let running = store.create();
        store.complete(done, vec![]);
        store.mark_processing(running);

        // Zero retention: every terminal task is already expired.
        let removed = store.sweep_expired(Duration::ZERO);
        assert_eq!(removed, 1);
        assert!(matches!(
            store.get(done),
            Err(MatchError::NotFound(_))
        ));
        assert!(store.get(running).is_ok());
    }

    #[test]
    fn test_sweep_keeps_recent_terminal_tasks() {
        let store = TaskStore::new();
        let id = store.create();
        store.complete(id, vec![]);

        let removed = store.sweep_expired(Duration::from_secs(600));
        assert_eq!(removed, 0);
        assert!(store.get(id).is_ok());
    }

    #[test]
    fn test_submit_returns_id_without_blocking() {
        let (orchestrator, mut receiver) = Orchestrator::new();
        let id = orchestrator
            .submit(ResumeInput::Text("Engineer. Rust.".to_string()))
            .unwrap();

        assert_eq!(orchestrator.status(id).unwrap().status, TaskStatus::Queued);

        let item = receiver.try_recv().unwrap();
        assert_eq!(item.task_id, id);
    }

    #[test]
    fn test_submit_with_closed_pool_fails_the_task() {
        let (orchestrator, receiver) = Orchestrator::new();
        drop(receiver);

        let id = orchestrator
            .submit(ResumeInput::Text("Engineer. Rust.".to_string()))
            .unwrap();
        let task = orchestrator.status(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.is_some());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
