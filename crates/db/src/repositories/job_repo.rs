//! Repository for the `jobs` table.
//!
//! Jobs are only ever created together with their task list, inside one
//! transaction. Status changes after creation come from task completion
//! (see [`JobRepo::refresh_progress`]) or cancellation.

use oiab_core::fan_out::TaskDescriptor;
use oiab_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::job::{CreateJob, Job, JobListQuery};
use crate::models::status::{status_ids, JobStatus, StatusId, TaskStatus};
use crate::models::task::Task;
use crate::repositories::TaskRepo;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, status_id, priority, product_sku, parameters, \
    progress_percent, submitted_at, completed_at, created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides persistence for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a job and its fanned-out tasks atomically.
    ///
    /// Either the job row and every task row are committed, or nothing is.
    /// Tasks are returned ordered by `sequence`.
    pub async fn create_with_tasks(
        pool: &PgPool,
        input: &CreateJob,
        tasks: &[TaskDescriptor],
    ) -> Result<(Job, Vec<Task>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO jobs (job_type, status_id, priority, product_sku, parameters) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(&input.job_type)
            .bind(JobStatus::Pending.id())
            .bind(input.priority)
            .bind(&input.product_sku)
            .bind(&input.parameters)
            .fetch_one(&mut *tx)
            .await?;

        let tasks = TaskRepo::insert_for_job(&mut tx, job.id, tasks).await?;

        tx.commit().await?;

        tracing::debug!(job_id = job.id, task_count = tasks.len(), "Job and tasks inserted");
        Ok((job, tasks))
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs with optional status filter and pagination, newest first.
    pub async fn list(pool: &PgPool, params: &JobListQuery) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = match params.status_id {
            Some(_) => format!(
                "SELECT {COLUMNS} FROM jobs \
                 WHERE status_id = $1 \
                 ORDER BY submitted_at DESC, id DESC \
                 LIMIT $2 OFFSET $3"
            ),
            None => format!(
                "SELECT {COLUMNS} FROM jobs \
                 ORDER BY submitted_at DESC, id DESC \
                 LIMIT $1 OFFSET $2"
            ),
        };

        let mut q = sqlx::query_as::<_, Job>(&query);
        if let Some(status_id) = params.status_id {
            q = q.bind(status_id);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Cancel a job and its pending tasks unless the job is already terminal.
    ///
    /// Returns `true` if the job was cancelled. Running tasks are left for
    /// their worker to finish; their results no longer move the job.
    pub async fn cancel(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW() \
             WHERE id = $1 AND status_id <> ALL($3)",
        )
        .bind(job_id)
        .bind(JobStatus::Cancelled.id())
        .bind(status_ids(&JobStatus::TERMINAL))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE tasks SET status_id = $2 WHERE job_id = $1 AND status_id = $3")
            .bind(job_id)
            .bind(TaskStatus::Cancelled.id())
            .bind(TaskStatus::Pending.id())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Lock a job row for the rest of the transaction and return its status.
    ///
    /// Claims, rollups and cancellation all take this lock before touching
    /// the job's tasks, so they serialize per job.
    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
    ) -> Result<Option<JobStatus>, sqlx::Error> {
        let status_id: Option<StatusId> =
            sqlx::query_scalar("SELECT status_id FROM jobs WHERE id = $1 FOR UPDATE")
                .bind(job_id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(status_id.and_then(JobStatus::from_id))
    }

    /// Recompute a job's progress and status from its tasks.
    ///
    /// The job row is locked before counting, so a rollup always sees task
    /// changes committed by rollups that ran before it. Terminal jobs are
    /// not touched. Returns the updated row, or `None` when the job is
    /// terminal or missing.
    pub async fn refresh_progress(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let current = match Self::lock_status(tx, job_id).await? {
            Some(status) if !status.is_terminal() => status,
            _ => return Ok(None),
        };

        let counts = sqlx::query_as::<_, TaskCounts>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status_id = $2) AS done, \
                    COUNT(*) FILTER (WHERE status_id = $3) AS failed, \
                    COUNT(*) FILTER (WHERE status_id <> $4) AS started \
             FROM tasks WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(TaskStatus::Completed.id())
        .bind(TaskStatus::Failed.id())
        .bind(TaskStatus::Pending.id())
        .fetch_one(&mut **tx)
        .await?;

        let (status, progress) = counts.rollup(current);
        let query = format!(
            "UPDATE jobs \
             SET status_id = $2, progress_percent = $3, \
                 completed_at = CASE WHEN $4 THEN NOW() ELSE NULL END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(status.id())
            .bind(progress)
            .bind(status.is_terminal())
            .fetch_one(&mut **tx)
            .await?;

        if status != current {
            tracing::debug!(job_id, from = ?current, to = ?status, progress, "Job status rolled up");
        }
        Ok(Some(job))
    }
}

/// Task counts for one job, by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
struct TaskCounts {
    total: i64,
    done: i64,
    failed: i64,
    /// Tasks that have left `pending`.
    started: i64,
}

impl TaskCounts {
    /// New job status and progress percentage.
    ///
    /// Any failed task fails the job, all tasks done completes it, and any
    /// started task makes it running.
    fn rollup(self, current: JobStatus) -> (JobStatus, i16) {
        let progress = if self.total == 0 {
            0
        } else {
            i16::try_from(self.done * 100 / self.total).unwrap_or(100)
        };

        let status = if self.failed > 0 {
            JobStatus::Failed
        } else if self.total > 0 && self.done == self.total {
            JobStatus::Completed
        } else if self.started > 0 {
            JobStatus::Running
        } else {
            current
        };
        (status, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(total: i64, done: i64, failed: i64, started: i64) -> TaskCounts {
        TaskCounts {
            total,
            done,
            failed,
            started,
        }
    }

    #[test]
    fn untouched_job_stays_pending() {
        assert_eq!(counts(4, 0, 0, 0).rollup(JobStatus::Pending), (JobStatus::Pending, 0));
    }

    #[test]
    fn claimed_task_makes_job_running() {
        assert_eq!(counts(4, 0, 0, 1).rollup(JobStatus::Pending), (JobStatus::Running, 0));
    }

    #[test]
    fn progress_rounds_down() {
        assert_eq!(counts(3, 1, 0, 2).rollup(JobStatus::Running), (JobStatus::Running, 33));
    }

    #[test]
    fn all_done_completes_job() {
        assert_eq!(counts(16, 16, 0, 16).rollup(JobStatus::Running), (JobStatus::Completed, 100));
    }

    #[test]
    fn any_failure_fails_job() {
        assert_eq!(counts(2, 1, 1, 2).rollup(JobStatus::Running), (JobStatus::Failed, 50));
    }
}
