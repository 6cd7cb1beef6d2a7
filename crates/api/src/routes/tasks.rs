//! Route definitions for the `/tasks` resource, used by generation workers.

use axum::routing::post;
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST   /claim           -> claim_task
/// POST   /{id}/complete   -> complete_task
/// POST   /{id}/fail       -> fail_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/claim", post(tasks::claim_task))
        .route("/{id}/complete", post(tasks::complete_task))
        .route("/{id}/fail", post(tasks::fail_task))
}
