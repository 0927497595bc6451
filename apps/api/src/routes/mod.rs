pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the upload ceiling for multipart framing.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/match-resume-async", post(handlers::handle_submit_match))
        .route("/task-status/:task_id", get(handlers::handle_task_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
