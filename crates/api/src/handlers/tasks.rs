//! Handlers for the `/tasks` resource.
//!
//! Generation workers claim pending tasks, then report either an output or
//! an error. Job status follows from task status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oiab_core::error::CoreError;
use oiab_core::types::DbId;
use oiab_db::models::task::{ClaimTask, CompleteTask, FailTask, Task};
use oiab_db::repositories::TaskRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Explain why a task could not be moved out of `running`.
async fn not_running(pool: &sqlx::PgPool, task_id: DbId) -> AppError {
    match TaskRepo::find_by_id(pool, task_id).await {
        Ok(Some(_)) => AppError::TaskNotRunning { task_id },
        Ok(None) => AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: task_id,
        }),
        Err(e) => AppError::Database(e),
    }
}

/// POST /api/v1/tasks/claim
///
/// Claim the next pending task. Returns 200 with the task, or 204 when
/// nothing is waiting.
pub async fn claim_task(
    State(state): State<AppState>,
    Json(input): Json<ClaimTask>,
) -> AppResult<Response> {
    let worker = input.worker.trim();
    if worker.is_empty() {
        return Err(AppError::BadRequest("worker must not be empty".into()));
    }

    match TaskRepo::claim_next(&state.pool, worker).await? {
        Some(task) => {
            tracing::info!(task_id = task.id, job_id = task.job_id, worker, "Task claimed");
            Ok(Json(DataResponse { data: task }).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /api/v1/tasks/{id}/complete
///
/// Store the generated output. 409 if the task is not running.
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<CompleteTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    let Some(task) = TaskRepo::complete(&state.pool, task_id, &input.output).await? else {
        return Err(not_running(&state.pool, task_id).await);
    };

    tracing::info!(task_id, job_id = task.job_id, "Task completed");
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/fail
///
/// Record a generation failure. The owning job fails with it.
pub async fn fail_task(
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<FailTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    let Some(task) = TaskRepo::fail(&state.pool, task_id, &input.error).await? else {
        return Err(not_running(&state.pool, task_id).await);
    };

    tracing::warn!(task_id, job_id = task.job_id, error = %input.error, "Task failed");
    Ok(Json(DataResponse { data: task }))
}
