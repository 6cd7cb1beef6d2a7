//! Repository for the `tasks` table.
//!
//! Rows are inserted only by [`JobRepo::create_with_tasks`]; workers then
//! move them `pending -> running -> completed | failed`.

use oiab_core::fan_out::TaskDescriptor;
use oiab_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::status::{status_ids, JobStatus, TaskStatus};
use crate::models::task::Task;
use crate::repositories::JobRepo;

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, job_id, task_type, sequence, doc_num, status_id, input, output, \
    error_message, claimed_by, claimed_at, completed_at, created_at, updated_at";

/// Provides persistence for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a job's fanned-out tasks inside the job's creation transaction.
    ///
    /// `uq_tasks_job_sequence` makes a second call for the same job fail.
    pub(crate) async fn insert_for_job(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        descriptors: &[TaskDescriptor],
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (job_id, task_type, sequence, doc_num, status_id, input) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );

        let mut tasks = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let task = sqlx::query_as::<_, Task>(&query)
                .bind(job_id)
                .bind(descriptor.task_type)
                .bind(descriptor.sequence)
                .bind(descriptor.input.doc_num)
                .bind(TaskStatus::Pending.id())
                .bind(Json(&descriptor.input))
                .fetch_one(&mut **tx)
                .await?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All tasks of a job, ordered by `sequence`.
    pub async fn list_by_job(pool: &PgPool, job_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE job_id = $1 ORDER BY sequence");
        sqlx::query_as::<_, Task>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim the next pending task of a live job.
    ///
    /// Picks the job by priority, then age, and takes its lowest-`sequence`
    /// pending task. The job row is locked before the task, the same order
    /// [`JobRepo::cancel`] uses, so a task of a job cancelled mid-claim is
    /// never handed out. Returns `None` when nothing is waiting.
    pub async fn claim_next(pool: &PgPool, worker: &str) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let live = status_ids(&JobStatus::LIVE);

        let claim = format!(
            "UPDATE tasks \
             SET status_id = $2, claimed_by = $3, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE job_id = $1 AND status_id = $4 \
                 ORDER BY sequence \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );

        let task = loop {
            let candidate: Option<DbId> = sqlx::query_scalar(
                "SELECT t.job_id FROM tasks t \
                 JOIN jobs j ON j.id = t.job_id \
                 WHERE t.status_id = $1 AND j.status_id = ANY($2) \
                 ORDER BY j.priority DESC, j.submitted_at ASC, t.job_id ASC \
                 LIMIT 1",
            )
            .bind(TaskStatus::Pending.id())
            .bind(&live)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(job_id) = candidate else {
                break None;
            };

            // Re-read under lock: the job may have been cancelled or drained
            // since the candidate query.
            match JobRepo::lock_status(&mut tx, job_id).await? {
                Some(status) if JobStatus::LIVE.contains(&status) => {}
                _ => continue,
            }

            let claimed = sqlx::query_as::<_, Task>(&claim)
                .bind(job_id)
                .bind(TaskStatus::Running.id())
                .bind(worker)
                .bind(TaskStatus::Pending.id())
                .fetch_optional(&mut *tx)
                .await?;
            if claimed.is_some() {
                break claimed;
            }
        };

        if let Some(task) = &task {
            JobRepo::refresh_progress(&mut tx, task.job_id).await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    /// Store a running task's output and mark it completed.
    ///
    /// Returns `None` if the task does not exist or is not running.
    pub async fn complete(
        pool: &PgPool,
        task_id: DbId,
        output: &serde_json::Value,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, output = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(TaskStatus::Completed.id())
            .bind(output)
            .bind(TaskStatus::Running.id())
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(task) = &task {
            JobRepo::refresh_progress(&mut tx, task.job_id).await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    /// Mark a running task failed. The owning job fails with it.
    ///
    /// Returns `None` if the task does not exist or is not running.
    pub async fn fail(
        pool: &PgPool,
        task_id: DbId,
        error: &str,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(TaskStatus::Failed.id())
            .bind(error)
            .bind(TaskStatus::Running.id())
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(task) = &task {
            JobRepo::refresh_progress(&mut tx, task.job_id).await?;
        }

        tx.commit().await?;
        Ok(task)
    }
}
