//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Database readiness check
//!
//! # Public band site (tenant from Host)
//! GET  /                            - Homepage
//! GET  /theme.css                   - Theme CSS variables
//! GET  /api/site                    - Site identity
//! GET  /api/theme                   - Theme
//! GET  /api/shows                   - Shows or Bandsintown widget
//! GET  /api/players                 - Spotify players
//! GET  /api/videos                  - YouTube videos
//! GET  /api/contact                 - Contact info
//! GET  /api/merch                   - Merch storefront
//!
//! # Newsletter
//! POST /newsletter/signup           - Subscribe (JSON or form, rate limited)
//! GET  /newsletter/unsubscribe      - Unsubscribe by token
//!
//! # Webhooks
//! POST /webhooks/ses                - SNS bounce/complaint notifications
//!
//! # Admin auth
//! POST /api/auth/login              - Password login (rate limited)
//! POST /api/auth/2fa/verify         - Second login step (rate limited)
//! POST /api/auth/logout             - Logout
//! GET  /api/auth/me                 - Current admin
//! POST /api/auth/password           - Change password (rate limited)
//! POST /api/auth/2fa/setup          - Start TOTP enrolment
//! POST /api/auth/2fa/enable         - Confirm enrolment
//! POST /api/auth/2fa/disable        - Turn off 2FA (rate limited)
//! POST /api/auth/2fa/recovery-codes - Regenerate recovery codes
//! GET  /api/auth/sessions           - Active sessions
//! DELETE /api/auth/sessions/{id}    - Revoke one session
//! POST /api/auth/sessions/revoke-others - Revoke all but this one
//!
//! # Admin API
//! GET|PUT    /api/admin/theme
//! GET|POST   /api/admin/shows
//! GET|PUT    /api/admin/shows/settings
//! PUT|DELETE /api/admin/shows/{id}
//! GET|PUT    /api/admin/contact
//! GET|POST   /api/admin/players
//! PUT        /api/admin/players/order
//! PUT|DELETE /api/admin/players/{id}
//! GET|POST   /api/admin/videos
//! PUT        /api/admin/videos/order
//! PUT|DELETE /api/admin/videos/{id}
//! GET|PUT    /api/admin/merch                         (owner)
//! GET        /api/admin/newsletter/subscribers
//! DELETE     /api/admin/newsletter/subscribers/{id}   (owner)
//! GET        /api/admin/newsletter/export.csv         (owner)
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod newsletter;
pub mod site;
pub mod webhooks;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, newsletter_rate_limiter, request_id_middleware,
    security_headers_middleware, tenant_middleware,
};
use crate::state::AppState;

/// Create the public JSON API router, nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/site", get(api::site))
        .route("/theme", get(api::theme))
        .route("/shows", get(api::shows))
        .route("/players", get(api::players))
        .route("/videos", get(api::videos))
        .route("/contact", get(api::contact))
        .route("/merch", get(api::merch))
}

/// Create the admin auth router, nested under `/api/auth`.
pub fn auth_routes() -> Router<AppState> {
    // Credential checks share one per-IP limiter
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/2fa/verify", post(auth::verify_two_factor))
        .route("/password", post(auth::change_password))
        .route("/2fa/disable", post(auth::disable_two_factor))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/2fa/setup", post(auth::setup_two_factor))
        .route("/2fa/enable", post(auth::enable_two_factor))
        .route("/2fa/recovery-codes", post(auth::regenerate_recovery_codes))
        .route("/sessions", get(auth::list_sessions))
        .route("/sessions/revoke-others", post(auth::revoke_other_sessions))
        .route("/sessions/{id}", delete(auth::revoke_session))
        .merge(limited)
}

/// Create the newsletter router, nested under `/newsletter`.
pub fn newsletter_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/signup",
            post(newsletter::signup).layer(newsletter_rate_limiter()),
        )
        .route("/unsubscribe", get(newsletter::unsubscribe))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public site
        .route("/", get(site::home))
        .route("/theme.css", get(site::theme_css))
        .nest("/api", api_routes())
        .nest("/newsletter", newsletter_routes())
        // Webhooks
        .route("/webhooks/ses", post(webhooks::ses))
        // Admin
        .nest("/api/auth", auth_routes())
        .nest("/api/admin", admin::routes())
}

/// Build the full application with its middleware stack.
///
/// Layers, outermost first: Sentry, trace, request id, security headers,
/// session, tenant resolution.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.sessions().clone(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(from_fn_with_state(state.clone(), tenant_middleware))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, header},
    };
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;
    use crate::services::EmailService;

    /// An app whose pool points at a closed port, so any query fails fast.
    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy("postgres://bandsite@127.0.0.1:1/bandsite")
            .unwrap();
        app(AppState::new(
            ServerConfig::for_tests(),
            pool,
            EmailService::disabled(),
        ))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_standard_headers() {
        let response = test_app().oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let response = test_app()
            .oneshot(get_request("/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_platform_host_is_unknown_site() {
        let request = Request::builder()
            .uri("/api/site")
            .header(header::HOST, "bandsite.app")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, r#"{"error":"Unknown site"}"#);
    }

    #[tokio::test]
    async fn test_admin_api_requires_site() {
        let request = Request::builder()
            .uri("/api/admin/theme")
            .header(header::HOST, "bandsite.app")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited() {
        let app = test_app();
        let mut statuses = Vec::new();

        for _ in 0..6 {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::HOST, "bandsite.app")
                .header("x-forwarded-for", "203.0.113.9")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"a@b.co","password":"x"}"#))
                .unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }

        assert!(statuses.iter().take(5).all(|s| *s != StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));
    }
}
