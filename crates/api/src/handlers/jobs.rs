//! Handlers for the `/jobs` resource.
//!
//! Submitting a job resolves its type, normalizes params, fans out its
//! tasks, and writes job and tasks in one transaction. An unknown job
//! type is rejected before anything is written.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use oiab_core::error::CoreError;
use oiab_core::fan_out::{fan_out, TaskDescriptor};
use oiab_core::job_spec::{normalize, JobKind, ParamWarning};
use oiab_core::products::Product;
use oiab_core::types::DbId;
use oiab_db::models::job::{CreateJob, Job, JobListQuery, SubmitJob};
use oiab_db::models::task::Task;
use oiab_db::repositories::{JobRepo, TaskRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// A newly created job with its tasks and any params that were defaulted.
#[derive(Debug, Serialize)]
pub struct SubmittedJob {
    pub job: Job,
    pub tasks: Vec<Task>,
    pub warnings: Vec<ParamWarning>,
}

/// Fan-out result for a job that was not persisted.
#[derive(Debug, Serialize)]
pub struct JobPreview {
    pub job_type: JobKind,
    pub tasks: Vec<TaskDescriptor>,
    pub warnings: Vec<ParamWarning>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A submission resolved down to the rows that will be written.
#[derive(Debug)]
struct PreparedJob {
    kind: JobKind,
    create: CreateJob,
    tasks: Vec<TaskDescriptor>,
    warnings: Vec<ParamWarning>,
}

/// Resolve the job type (directly or via product SKU), normalize params,
/// and fan out. Pure: nothing is written.
fn prepare(input: SubmitJob) -> AppResult<PreparedJob> {
    let parameters = match input.parameters {
        serde_json::Value::Null => serde_json::json!({}),
        other => other,
    };

    let (kind, product, parameters) =
        match (input.job_type.as_deref(), input.product_sku.as_deref()) {
            (Some(job_type), None) => (JobKind::parse(job_type)?, None, parameters),
            (None, Some(sku)) => {
                let product = Product::from_sku(sku)?;
                (
                    product.job_kind(),
                    Some(product),
                    product.prepare_params(parameters),
                )
            }
            _ => {
                return Err(AppError::Core(CoreError::Validation(
                    "Exactly one of job_type or product_sku must be provided".into(),
                )))
            }
        };

    let normalized = normalize(kind.as_str(), &parameters)?;
    if let Some(product) = product {
        product.check(&normalized.spec)?;
    }
    let tasks = fan_out(&normalized.spec);

    Ok(PreparedJob {
        kind,
        create: CreateJob {
            job_type: kind.as_str().to_string(),
            product_sku: product.map(|p| p.sku().to_string()),
            parameters,
            priority: input.priority.unwrap_or(0),
        },
        tasks,
        warnings: normalized.warnings,
    })
}

fn log_warnings(kind: JobKind, warnings: &[ParamWarning]) {
    for warning in warnings {
        tracing::warn!(job_type = %kind, warning = %warning, "Job params defaulted");
    }
}

async fn find_job(pool: &sqlx::PgPool, job_id: DbId) -> AppResult<Job> {
    JobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Create a job and its full task list atomically. Returns 201 with the
/// job, its tasks, and any params warnings.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitJob>,
) -> AppResult<impl IntoResponse> {
    let prepared = prepare(input)?;
    log_warnings(prepared.kind, &prepared.warnings);

    let (job, tasks) =
        JobRepo::create_with_tasks(&state.pool, &prepared.create, &prepared.tasks).await?;

    tracing::info!(
        job_id = job.id,
        job_type = %job.job_type,
        task_count = tasks.len(),
        "Job submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmittedJob {
                job,
                tasks,
                warnings: prepared.warnings,
            },
        }),
    ))
}

/// POST /api/v1/jobs/preview
///
/// Run normalization and fan-out without writing anything.
pub async fn preview_job(Json(input): Json<SubmitJob>) -> AppResult<impl IntoResponse> {
    let prepared = prepare(input)?;

    Ok(Json(DataResponse {
        data: JobPreview {
            job_type: prepared.kind,
            tasks: prepared.tasks,
            warnings: prepared.warnings,
        },
    }))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// List jobs, newest first. Supports optional `status_id`, `limit`, and
/// `offset` query parameters.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_job(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/tasks
///
/// The job's tasks ordered by `sequence`.
pub async fn list_job_tasks(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_job(&state.pool, job_id).await?;
    let tasks = TaskRepo::list_by_job(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/cancel
///
/// Cancel a pending or running job and its pending tasks. Returns 204 on
/// success, 409 if the job is already in a terminal state.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_job(&state.pool, job_id).await?;

    if !JobRepo::cancel(&state.pool, job_id).await? {
        return Err(AppError::JobFinished { job_id });
    }

    tracing::info!(job_id, "Job cancelled");
    Ok(StatusCode::NO_CONTENT)
}
