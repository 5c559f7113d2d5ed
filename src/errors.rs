use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Service-level error taxonomy.
///
/// Missing master data (no transport rate, no fixed charge, no drum-cost
/// record) is deliberately NOT represented here: it resolves to a zero-cost
/// contribution with a provenance note, so an incomplete rate table never
/// blocks a quotation from being costed. Routing failures are likewise
/// caught at the router boundary and logged, never surfaced to the caller.
#[derive(Error, Debug, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} with ID {} not found", entity, id))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}
