//! Task entity models and DTOs.

use oiab_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub job_id: DbId,
    pub task_type: String,
    pub sequence: i32,
    pub doc_num: i32,
    pub status_id: StatusId,
    pub input: serde_json::Value,
    pub output: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /api/v1/tasks/claim`.
#[derive(Debug, Deserialize)]
pub struct ClaimTask {
    /// Free-text identity of the claiming worker.
    pub worker: String,
}

/// Body of `POST /api/v1/tasks/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteTask {
    pub output: serde_json::Value,
}

/// Body of `POST /api/v1/tasks/{id}/fail`.
#[derive(Debug, Deserialize)]
pub struct FailTask {
    pub error: String,
}
