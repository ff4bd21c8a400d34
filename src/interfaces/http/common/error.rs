//! Domain error → HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use super::ApiResponse;
use crate::shared::errors::DomainError;

/// Handler error. Converts from [`DomainError`] so handlers can use `?`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
            DomainError::AlreadyFinalized { .. } => StatusCode::CONFLICT,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Contention(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message shown to the caller. Storage and lock details stay in the logs.
    pub fn public_message(&self) -> String {
        match &self.0 {
            DomainError::Contention(_) => {
                "The service is busy, please try again in a moment".to_string()
            }
            DomainError::Internal(_) | DomainError::Conflict(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            DomainError::Internal(detail) | DomainError::Conflict(detail) => {
                error!(error = %detail, "Request failed")
            }
            DomainError::Contention(detail) => warn!(error = %detail, "Request hit contention"),
            _ => {}
        }
        let body = ApiResponse::<()>::error(self.public_message());
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers returning the standard envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap a value in a successful envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::CapacityExceeded {
                    requested: 2,
                    available: Some(1),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::not_found("Reservation", "id", "x"), StatusCode::NOT_FOUND),
            (
                DomainError::AlreadyFinalized {
                    status: "CANCELLED".into(),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::Contention("k".into()), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Unauthorized("k".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("k".into()), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError(DomainError::Internal("sqlite: disk I/O error".into()));
        assert!(!err.public_message().contains("sqlite"));
        let err = ApiError(DomainError::Contention("market@2024-06-03".into()));
        assert!(!err.public_message().contains("market"));
    }

    #[test]
    fn capacity_message_is_actionable() {
        let err = ApiError(DomainError::CapacityExceeded {
            requested: 4,
            available: Some(3),
        });
        assert!(err.public_message().contains("only 3 available"));
    }
}
