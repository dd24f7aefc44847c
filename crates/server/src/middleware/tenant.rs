//! Tenant resolution middleware and extractor.
//!
//! The middleware resolves the request host once and stores the result in
//! request extensions. Handlers that serve a band site take [`RequireTenant`];
//! host-independent routes (health checks, webhooks) simply ignore it.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::CurrentTenant;
use crate::state::AppState;
use crate::tenancy::request_host;

/// Resolve the tenant for the request host and attach it as [`CurrentTenant`].
///
/// # Errors
///
/// Returns `AppError::Database` if the tenant lookup fails. An unknown host
/// is not an error here.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(host) = request_host(request.headers()) {
        if let Some(tenant) = state.tenants().resolve(&host).await? {
            sentry::configure_scope(|scope| {
                scope.set_tag("tenant", tenant.slug.as_str());
            });
            request.extensions_mut().insert(CurrentTenant(tenant));
        }
    }

    Ok(next.run(request).await)
}

/// Extractor for the tenant served on this host.
///
/// Rejects with 404 `Unknown site` when the host maps to no active tenant.
pub struct RequireTenant(pub CurrentTenant);

impl<S> FromRequestParts<S> for RequireTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentTenant>()
            .cloned()
            .map(Self)
            .ok_or_else(AppError::unknown_site)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use bandsite_core::{Slug, TenantId};
    use tower::ServiceExt;

    use super::*;
    use crate::models::Tenant;

    async fn band_name(RequireTenant(tenant): RequireTenant) -> String {
        tenant.name.clone()
    }

    fn tenant() -> CurrentTenant {
        let now = chrono::Utc::now();
        CurrentTenant(Arc::new(Tenant {
            id: TenantId::new(7),
            slug: Slug::parse("owls").unwrap(),
            name: "Midnight Owls".to_string(),
            custom_domain: None,
            active: true,
            created_at: now,
            updated_at: now,
        }))
    }

    #[tokio::test]
    async fn test_missing_tenant_is_unknown_site() {
        let response = Router::new()
            .route("/", get(band_name))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tenant_from_extensions() {
        let response = Router::new()
            .route("/", get(band_name))
            .oneshot({
                let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
                request.extensions_mut().insert(tenant());
                request
            })
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
