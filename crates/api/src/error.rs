//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`
//! and every failure leaves as `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use tripmart_core::Caller;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::auth::AuthError;
use crate::services::guard::AccessError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness conflict.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Rejected(msg) => Self::BadRequest(msg),
            RepositoryError::Access(access) => access.into(),
            other @ (RepositoryError::Database(_) | RepositoryError::DataCorruption(_)) => {
                Self::Database(other)
            }
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(_) => Self::NotFound(err.to_string()),
            AccessError::Forbidden(_) => Self::Forbidden(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidKey => Self::Internal(err.to_string()),
            _ => Self::Unauthorized(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the authenticated caller.
pub fn set_sentry_caller(caller: &Caller) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(caller.subject.to_string()),
            ..Default::default()
        }));
        scope.set_tag("caller.role", caller.role.as_str());
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_statuses() {
        let cases = [
            (RepositoryError::NotFound, StatusCode::NOT_FOUND),
            (
                RepositoryError::Conflict("taken".into()),
                StatusCode::CONFLICT,
            ),
            (
                RepositoryError::Rejected("only 2 left in stock".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepositoryError::Access(AccessError::Forbidden("product")),
                StatusCode::FORBIDDEN,
            ),
            (
                RepositoryError::Access(AccessError::NotFound("product")),
                StatusCode::NOT_FOUND,
            ),
            (
                RepositoryError::DataCorruption("bad row".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        assert_eq!(
            AppError::from(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::InvalidKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_is_error_json() {
        let (status, body) = body_json(AppError::Forbidden(
            "you are not allowed to modify this product".into(),
        ))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({"error": "you are not allowed to modify this product"})
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = body_json(AppError::Database(RepositoryError::DataCorruption(
            "negative quantity: -4".into(),
        )))
        .await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }
}
