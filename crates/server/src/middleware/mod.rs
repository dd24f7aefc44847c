//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP and friends on every response)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Tenant resolution (host to [`CurrentTenant`](crate::models::CurrentTenant))
//!
//! Rate limiters are attached per route group in [`crate::routes`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tenant;

pub use auth::{AuthRejection, RequireAdmin, RequireOwner};
pub use rate_limit::{ClientIp, auth_rate_limiter, client_ip, newsletter_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use tenant::{RequireTenant, tenant_middleware};
