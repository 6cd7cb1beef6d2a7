//! Job entity models and DTOs.

use oiab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status_id: StatusId,
    pub priority: i32,
    pub product_sku: Option<String>,
    pub parameters: serde_json::Value,
    pub progress_percent: i16,
    pub submitted_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for a job whose type and params are already validated.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub job_type: String,
    pub product_sku: Option<String>,
    pub parameters: serde_json::Value,
    pub priority: i32,
}

/// DTO for submitting a new job via `POST /api/v1/jobs`.
///
/// Exactly one of `job_type` and `product_sku` must be set.
#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub job_type: Option<String>,
    pub product_sku: Option<String>,
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub priority: Option<i32>,
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by status ID (e.g. 1 = pending, 4 = failed).
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
