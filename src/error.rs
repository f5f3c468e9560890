use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::{models::BoosterId, storage::StorageError},
    state::booster::BoosterStateError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Broken internal precondition or corrupted data.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupted { .. } => ServiceError::Internal(err.to_string()),
            StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
        }
    }
}

impl From<BoosterStateError> for ServiceError {
    fn from(err: BoosterStateError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Two activated, unexpired boosters were observed for the same scope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("scope `{scope}` has several active boosters: kept `{kept}`, skipped `{skipped}` (owner {skipped_owner})")]
pub struct InvariantAnomaly {
    /// Scope holding several active boosters.
    pub scope: String,
    /// Booster left in the registry.
    pub kept: BoosterId,
    /// Booster ignored by the registry.
    pub skipped: BoosterId,
    /// Owner of the ignored booster.
    pub skipped_owner: String,
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_rows_are_internal_errors() {
        let err: ServiceError = StorageError::Corrupted {
            id: 4,
            reason: "multiplier 1 is out of range".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[test]
    fn degraded_maps_to_service_unavailable() {
        let response = AppError::from(ServiceError::Degraded).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_state_maps_to_conflict() {
        let response =
            AppError::from(ServiceError::InvalidState("already loading".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
