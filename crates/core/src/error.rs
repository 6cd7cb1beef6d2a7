use crate::types::DbId;

/// Domain errors raised while resolving and validating a job submission.
///
/// Missing or malformed params fields are not errors; they default and are
/// reported as warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Unknown job type '{tag}'. Must be one of: {expected}")]
    UnknownJobType { tag: String, expected: String },

    #[error("Unknown product SKU '{0}'")]
    UnknownProduct(String),

    #[error("Product '{sku}' covers at most {max} system(s), {requested} requested")]
    SystemLimit {
        sku: &'static str,
        max: usize,
        requested: usize,
    },

    #[error("Validation failed: {0}")]
    Validation(String),
}
