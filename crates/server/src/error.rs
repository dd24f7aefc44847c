//! Unified error handling for the HTTP layer.
//!
//! Every handler returns `Result<_, AppError>`. Responses are JSON
//! `{"error": "<message>"}`; server-side failures are reported to Sentry and
//! answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{
    AuthError, EmailError, MerchError, NewsletterError, SesWebhookError, ValidationError,
};
use crate::shopify::ShopifyError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// A submitted field is invalid.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("{0}")]
    Conflict(String),

    /// An upstream service (other than Shopify) failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Shorthand for the 404 returned when no site matches the host.
    #[must_use]
    pub fn unknown_site() -> Self {
        Self::NotFound("Unknown site".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Shopify(_) | Self::Upstream(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(_) | Self::Internal(_) => json!({"error": "Internal server error"}),
            Self::Shopify(_) | Self::Upstream(_) => json!({"error": "External service error"}),
            Self::Validation(e) => json!({"error": e.to_string(), "field": e.field}),
            _ => json!({"error": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials
            | AuthError::InvalidCode
            | AuthError::LoginExpired
            | AuthError::TooManyAttempts => Self::Unauthorized(e.to_string()),
            AuthError::TwoFactorNotEnabled
            | AuthError::TwoFactorAlreadyEnabled
            | AuthError::SetupMissing
            | AuthError::WeakPassword(_) => Self::BadRequest(e.to_string()),
            AuthError::SessionNotFound => Self::NotFound(e.to_string()),
            AuthError::PasswordHash(_) => Self::Internal(e.to_string()),
            AuthError::Repository(e) => e.into(),
        }
    }
}

impl From<NewsletterError> for AppError {
    fn from(e: NewsletterError) -> Self {
        match e {
            NewsletterError::Validation(e) => e.into(),
            NewsletterError::Repository(e) => e.into(),
            NewsletterError::Csv(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<MerchError> for AppError {
    fn from(e: MerchError) -> Self {
        match e {
            MerchError::Validation(e) => e.into(),
            MerchError::Repository(e) => e.into(),
            MerchError::Shopify(e) => e.into(),
        }
    }
}

impl From<SesWebhookError> for AppError {
    fn from(e: SesWebhookError) -> Self {
        match e {
            SesWebhookError::InvalidPayload(_) | SesWebhookError::UntrustedSubscribeUrl(_) => {
                Self::BadRequest(e.to_string())
            }
            SesWebhookError::Confirmation(_) => Self::Upstream(e.to_string()),
            SesWebhookError::Repository(e) => e.into(),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(e: EmailError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {e}"))
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        Self::Internal(format!("template error: {e}"))
    }
}

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: i32, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("test".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("test".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ShopifyError::RateLimited(2)).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_errors() {
        assert_eq!(
            AppError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("slug taken".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::WeakPassword("too short".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::SessionNotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_unknown_site_body() {
        let (status, body) = body_json(AppError::unknown_site()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"error": "Unknown site"}));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (_, body) = body_json(AppError::Internal("connection refused".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_body_names_field() {
        let err = AppError::from(ValidationError::new("venue", "is required"));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "venue: is required");
        assert_eq!(body["field"], "venue");
    }
}
