//! Error types for the herd cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Failures raised by a [`Store`](crate::store::Store) backend.
///
/// The herd layer never creates these itself; it passes them through untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key rejected by the backend (empty or too long)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value exceeds the backend's item size limit
    #[error("Value too large: {size} bytes (max {max})")]
    ValueTooLarge { size: usize, max: usize },

    /// Backend is full and could not make room
    #[error("Store full: {0}")]
    Full(String),

    /// Backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Config Error Enum ==
/// Invalid process configuration, detected at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

// == Cache Error Enum ==
/// Service-level error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found, or soft-missed by the herd protocol
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Add on a key that already exists
    #[error("Key already exists: {0}")]
    Conflict(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure reported by the backing store
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Conflict(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Store(StoreError::InvalidKey(_))
            | CacheError::Store(StoreError::ValueTooLarge { .. }) => StatusCode::BAD_REQUEST,
            CacheError::Store(StoreError::Full(_)) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service layer.
pub type Result<T> = std::result::Result<T, CacheError>;
