//! Axum route handlers for the matching API.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, MatchError};
use crate::matching::normalizer::ResumeInput;
use crate::state::AppState;
use crate::tasks::Task;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitMatchRequest {
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitMatchResponse {
    pub task_id: Uuid,
    pub status: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /match-resume-async
///
/// Accepts either a JSON body with `resume_text` or a multipart form with a
/// `resume_file` part (PDF, DOCX or plain text) — exactly one source.
/// Registers the task and returns `202 {task_id, status: "queued"}` without
/// waiting for parsing or scoring.
pub async fn handle_submit_match(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let input = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?;
        input_from_multipart(multipart).await?
    } else {
        let Json(body) = Json::<SubmitMatchRequest>::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))?;
        assemble_input(body.resume_text, None)?
    };

    input.validate(state.config.max_upload_bytes)?;

    let task_id = state.orchestrator.submit(input)?;
    tracing::info!("Accepted match task {task_id}");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitMatchResponse {
            task_id,
            status: "queued",
        }),
    ))
}

/// GET /task-status/:task_id
///
/// Returns the current task snapshot, or 404 once the id is unknown or has
/// been reclaimed by the retention sweep.
pub async fn handle_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = Uuid::parse_str(&task_id)
        .map_err(|_| AppError::NotFound(format!("Task {task_id} not found")))?;
    let task = state.orchestrator.status(id)?;
    Ok(Json(task))
}

// ────────────────────────────────────────────────────────────────────────────
// Input assembly
// ────────────────────────────────────────────────────────────────────────────

async fn input_from_multipart(mut multipart: Multipart) -> Result<ResumeInput, AppError> {
    let mut text: Option<String> = None;
    let mut file: Option<(Bytes, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "resume_text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable resume_text: {e}")))?;
                text = Some(value);
            }
            "resume_file" => {
                let mime = field
                    .content_type()
                    .ok_or_else(|| {
                        AppError::Validation("resume_file must declare a content type".to_string())
                    })?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable resume_file: {e}")))?;
                file = Some((bytes, mime));
            }
            other => {
                tracing::debug!("Ignoring unexpected multipart field '{other}'");
            }
        }
    }

    Ok(assemble_input(text, file)?)
}

/// Enforces the exactly-one-source rule before any task exists.
fn assemble_input(
    text: Option<String>,
    file: Option<(Bytes, String)>,
) -> Result<ResumeInput, MatchError> {
    match (text, file) {
        (Some(_), Some(_)) => Err(MatchError::InvalidInput(
            "provide either resume_text or resume_file, not both".to_string(),
        )),
        (Some(text), None) => Ok(ResumeInput::Text(text)),
        (None, Some((bytes, mime))) => Ok(ResumeInput::File { bytes, mime }),
        (None, None) => Err(MatchError::InvalidInput(
            "either resume_text or resume_file is required".to_string(),
        )),
    }
}
