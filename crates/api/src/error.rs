//! HTTP error mapping.
//!
//! Every failure leaves the API as `{ "error": <message>, "code": <CODE> }`.
//! Codes are stable identifiers clients can branch on; messages are for
//! humans. Storage failures are logged and returned with a sanitized message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use oiab_core::error::CoreError;
use oiab_core::types::DbId;
use serde_json::json;

/// Application-level error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Job submission or lookup rejected by the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request outside of job params (e.g. a blank worker name).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A worker reported on a task it does not currently hold.
    #[error("Task {task_id} is not running")]
    TaskNotRunning { task_id: DbId },

    /// Cancel requested for a job that already completed, failed, or was
    /// cancelled.
    #[error("Job {job_id} has already finished and cannot be cancelled")]
    JobFinished { job_id: DbId },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const SANITIZED: &str = "An internal error occurred";

impl AppError {
    /// HTTP status and stable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::UnknownJobType { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_JOB_TYPE"),
                CoreError::UnknownProduct(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_PRODUCT"),
                CoreError::SystemLimit { .. } => {
                    (StatusCode::BAD_REQUEST, "SYSTEM_LIMIT_EXCEEDED")
                }
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::TaskNotRunning { .. } => (StatusCode::CONFLICT, "TASK_NOT_RUNNING"),
            AppError::JobFinished { .. } => (StatusCode::CONFLICT, "JOB_ALREADY_FINISHED"),
        }
    }

    /// Client-facing message. Storage details never leave the server.
    fn public_message(&self) -> String {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            AppError::Core(CoreError::Validation(msg)) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            AppError::Database(sqlx::Error::Database(db_err)) if is_unique_violation(&**db_err) => {
                format!(
                    "Duplicate value violates unique constraint: {}",
                    db_err.constraint().unwrap_or("unknown")
                )
            }
            AppError::Database(_) => SANITIZED.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = json!({
            "error": self.public_message(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// `23505` on a constraint following the `uq_` naming convention.
fn is_unique_violation(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    db_err.code().as_deref() == Some("23505")
        && db_err.constraint().is_some_and(|name| name.starts_with("uq_"))
}

/// Map a sqlx error to a status and code.
///
/// `RowNotFound` is 404 and `uq_*` unique violations are 409. A violation
/// of `uq_tasks_job_*` means a task list already exists for the job.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        sqlx::Error::Database(db_err) if is_unique_violation(&**db_err) => {
            match db_err.constraint() {
                Some(name) if name.starts_with("uq_tasks_job_") => {
                    (StatusCode::CONFLICT, "TASKS_ALREADY_CREATED")
                }
                _ => (StatusCode::CONFLICT, "CONFLICT"),
            }
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}
