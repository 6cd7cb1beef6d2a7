pub mod health;
pub mod jobs;
pub mod products;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /products                     store catalog (GET)
///
/// /jobs                         list, submit
/// /jobs/preview                 fan-out without persisting (POST)
/// /jobs/{id}                    get
/// /jobs/{id}/tasks              list tasks (GET)
/// /jobs/{id}/cancel             cancel (POST)
///
/// /tasks/claim                  claim next pending task (POST)
/// /tasks/{id}/complete          complete a running task (POST)
/// /tasks/{id}/fail              fail a running task (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/jobs", jobs::router())
        .nest("/tasks", tasks::router())
}
