use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::order::OrderStatus;

/// Errors produced by the order engine's services and repositories.
///
/// Expected business-rule failures (bad geometry, an illegal transition, a
/// lost compare-and-swap race) are all values of this enum; callers translate
/// them into user-facing messages. The engine never panics on business input.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Concurrent modification of order {0}")]
    ConcurrentModification(u64),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Collapses `validator` derive output into a single `ValidationError`.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}
