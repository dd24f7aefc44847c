//! Authentication extractors for admin API routes.
//!
//! A request is authenticated when its session carries a [`CurrentAdmin`]
//! whose `admin_session` row is still active and whose tenant matches the
//! host's tenant. Revoking the row logs the session out on its next request.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use bandsite_core::AdminRole;
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::middleware::tenant::RequireTenant;
use crate::models::{CurrentAdmin, CurrentTenant, session_keys};
use crate::services::AuthService;
use crate::state::AppState;

/// Minimum seconds between `last_seen_at` writes for one session.
const TOUCH_INTERVAL_SECONDS: i64 = 60;

/// Extractor that requires an authenticated admin of the host's tenant.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin { admin, tenant, .. }: RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {} of {}!", admin.name, tenant.name)
/// }
/// ```
pub struct RequireAdmin {
    pub admin: CurrentAdmin,
    pub tenant: CurrentTenant,
    pub session: Session,
}

/// Error returned when an admin route is called without valid authentication.
#[derive(Debug)]
pub enum AuthRejection {
    /// No session, not logged in, or the session was revoked.
    Unauthorized,
    /// Logged in, but for another tenant or without the needed role.
    Forbidden(&'static str),
    /// The host maps to no tenant, or a lookup failed.
    App(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            }
            Self::Forbidden(message) => AppError::Forbidden(message.to_string()).into_response(),
            Self::App(e) => e.into_response(),
        }
    }
}

impl From<AppError> for AuthRejection {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireTenant(tenant) = RequireTenant::from_request_parts(parts, state).await?;

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .map_err(AppError::from)?
            .ok_or(AuthRejection::Unauthorized)?;

        if admin.tenant_id != tenant.id() {
            return Err(AuthRejection::Forbidden("Not an admin of this site"));
        }

        let auth = AuthService::new(state.pool());
        if auth
            .active_session(admin.id, admin.session_record)
            .await
            .map_err(AppError::from)?
            .is_none()
        {
            tracing::info!(admin_id = %admin.id, "Rejected revoked admin session");
            session.flush().await.map_err(AppError::from)?;
            return Err(AuthRejection::Unauthorized);
        }

        touch_if_stale(&session, &auth, &admin).await?;
        set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));

        Ok(Self {
            admin,
            tenant,
            session,
        })
    }
}

/// Write `last_seen_at` at most once per [`TOUCH_INTERVAL_SECONDS`].
async fn touch_if_stale(
    session: &Session,
    auth: &AuthService<'_>,
    admin: &CurrentAdmin,
) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp();
    let last: Option<i64> = session.get(session_keys::LAST_SEEN_TOUCH).await?;

    if last.is_none_or(|t| now - t >= TOUCH_INTERVAL_SECONDS) {
        auth.touch_session(admin.session_record).await?;
        session.insert(session_keys::LAST_SEEN_TOUCH, now).await?;
    }
    Ok(())
}

/// Extractor that requires the `owner` role.
///
/// Used for merch credentials, subscriber deletion and exports.
pub struct RequireOwner(pub RequireAdmin);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = RequireAdmin::from_request_parts(parts, state).await?;
        if auth.admin.role != AdminRole::Owner {
            return Err(AuthRejection::Forbidden("Owner access required"));
        }
        Ok(Self(auth))
    }
}

impl AuthRejection {
    /// HTTP status this rejection responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::App(e) => e.status(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_rejection_bodies() {
        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Authentication required");

        let response = AuthRejection::Forbidden("Owner access required").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unknown_site_passes_through() {
        let rejection = AuthRejection::from(AppError::unknown_site());
        assert_eq!(rejection.status(), StatusCode::NOT_FOUND);
    }
}
