//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                -> list_jobs
/// POST   /                -> submit_job
/// POST   /preview         -> preview_job
/// GET    /{id}            -> get_job
/// GET    /{id}/tasks      -> list_job_tasks
/// POST   /{id}/cancel     -> cancel_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::submit_job))
        .route("/preview", post(jobs::preview_job))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/tasks", get(jobs::list_job_tasks))
        .route("/{id}/cancel", post(jobs::cancel_job))
}
