use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Domain error taxonomy for the matching engine.
///
/// `InvalidInput` is rejected before a task exists; `ParseFailure` and
/// `ScoringExhausted` fail the owning task; `Timeout` and `ConnectionLost`
/// are raised only by the polling client, never by the server.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resume could not be parsed: {0}")]
    ParseFailure(String),

    #[error("all {failed} postings failed to score")]
    ScoringExhausted { failed: usize },

    #[error("task {0} not found")]
    NotFound(uuid::Uuid),

    #[error("polling gave up after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("connection lost after {consecutive_errors} consecutive poll errors")]
    ConnectionLost { consecutive_errors: u32 },
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::InvalidInput(msg) => AppError::Validation(msg),
            MatchError::NotFound(id) => AppError::NotFound(format!("Task {id} not found")),
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_validation() {
        let app: AppError = MatchError::InvalidInput("no resume".into()).into();
        assert!(matches!(app, AppError::Validation(_)));
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let id = uuid::Uuid::new_v4();
        let app: AppError = MatchError::NotFound(id).into();
        match app {
            AppError::NotFound(msg) => assert!(msg.contains(&id.to_string())),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_task_failures_map_to_internal() {
        let app: AppError = MatchError::ScoringExhausted { failed: 3 }.into();
        assert!(matches!(app, AppError::Internal(_)));
    }
}
