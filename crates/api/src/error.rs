//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! rendered as `{ "code", "message", "timestamp" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use kiosky_core::{DomainError, EmailError, PriceError, SlugError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid bearer token, or its subject no longer exists.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but not allowed to touch this resource.
    #[error("Access denied")]
    AccessDenied,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique value is already taken.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Delete refused because dependents still exist.
    #[error("Resource in use: {0}")]
    ResourceInUse(String),

    /// Unknown email or wrong password. One message for both.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Bad request from client.
    #[error("{0}")]
    Validation(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::AccessDenied => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::ResourceInUse(_) => "RESOURCE_IN_USE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::ResourceInUse(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn not_found(entity: &str) -> Self {
        Self::NotFound(entity.to_owned())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(subject) => Self::AlreadyExists(subject),
            RepositoryError::InUse(reason) => Self::ResourceInUse(reason),
            RepositoryError::NotFound => Self::not_found("Resource"),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(e) => Self::Validation(e.to_string()),
            AuthError::WeakPassword(msg) => Self::Validation(msg),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Token(_) | AuthError::PrincipalNotFound | AuthError::NoActivePrincipal => {
                Self::Unauthenticated
            }
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
            AuthError::Repository(e) => e.into(),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Validation(format!("Invalid email: {err}"))
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::Validation(format!("Invalid domain: {err}"))
    }
}

impl From<SlugError> for AppError {
    fn from(err: SlugError) -> Self {
        Self::Validation(format!("Invalid slug: {err}"))
    }
}

impl From<PriceError> for AppError {
    fn from(err: PriceError) -> Self {
        Self::Validation(format!("Invalid price: {err}"))
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
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

        let body = ErrorBody {
            code: self.code(),
            message,
            timestamp: Utc::now(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::not_found("Store").to_string(), "Store not found");
        assert_eq!(
            AppError::AlreadyExists("domain".to_string()).to_string(),
            "domain already exists"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::AccessDenied), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::ResourceInUse("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_errors() {
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("email".to_string())),
            AppError::AlreadyExists(ref s) if s == "email"
        ));
        assert!(matches!(
            AppError::from(RepositoryError::InUse("busy".to_string())),
            AppError::ResourceInUse(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::DataCorruption("bad".to_string())),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_token_failures_are_unauthenticated() {
        assert!(matches!(
            AppError::from(AuthError::NoActivePrincipal),
            AppError::Unauthenticated
        ));
        assert!(matches!(
            AppError::from(AuthError::PrincipalNotFound),
            AppError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("secret detail".to_string()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
        assert!(body["timestamp"].is_string());
    }
}
