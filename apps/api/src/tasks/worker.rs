//! Bounded worker pool — claims queued tasks and drives the match
//! pipeline to a terminal state.
//!
//! Each worker owns at most one task at a time; the shared mpsc receiver
//! guarantees an id is claimed exactly once. A panic inside the pipeline
//! is contained by the inner join handle and recorded as a task failure.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::matching::pipeline::{run_match, MatchContext};
use crate::tasks::{TaskStore, WorkItem};

pub fn spawn_workers(
    count: usize,
    receiver: mpsc::UnboundedReceiver<WorkItem>,
    store: TaskStore,
    ctx: Arc<MatchContext>,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));

    (0..count.max(1))
        .map(|worker_id| {
            let receiver = receiver.clone();
            let store = store.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                loop {
                    // Hold the lock only for the claim itself.
                    let item = { receiver.lock().await.recv().await };
                    let Some(item) = item else {
                        break; // queue closed
                    };
                    process(worker_id, item, &store, &ctx).await;
                }
                debug!("Worker {worker_id} exiting");
            })
        })
        .collect()
}

async fn process(worker_id: usize, item: WorkItem, store: &TaskStore, ctx: &Arc<MatchContext>) {
    let id = item.task_id;
    store.mark_processing(id);
    info!("Worker {worker_id} claimed task {id}");

    let handle = tokio::spawn({
        let ctx = ctx.clone();
        let progress_store = store.clone();
        async move {
            run_match(&item.input, &ctx, move |p| {
                progress_store.update_progress(id, p)
            })
            .await
        }
    });

    match handle.await {
        Ok(Ok(results)) => {
            info!(
                "Worker {worker_id} completed task {id} with {} results",
                results.len()
            );
            store.complete(id, results);
        }
        Ok(Err(e)) => {
            warn!("Worker {worker_id} failed task {id}: {e}");
            store.fail(id, e.to_string());
        }
        Err(join_err) => {
            error!("Worker {worker_id} lost task {id}: {join_err}");
            store.fail(id, format!("internal error: {join_err}"));
        }
    }
}
