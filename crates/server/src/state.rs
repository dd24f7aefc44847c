//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;
use crate::services::EmailService;
use crate::shopify::StorefrontClient;
use crate::tenancy::TenantResolver;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    sessions: PostgresStore,
    tenants: TenantResolver,
    storefront: StorefrontClient,
    email: EmailService,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, email: EmailService) -> Self {
        let sessions = PostgresStore::new(pool.clone());
        let tenants = TenantResolver::new(
            pool.clone(),
            config.platform_domain.clone(),
            config.dev_tenant.clone(),
        );
        let storefront = StorefrontClient::new(&config.shopify);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
                tenants,
                storefront,
                email,
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The session store behind the session layer.
    #[must_use]
    pub fn sessions(&self) -> &PostgresStore {
        &self.inner.sessions
    }

    /// Host to tenant resolution.
    #[must_use]
    pub fn tenants(&self) -> &TenantResolver {
        &self.inner.tenants
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Transactional email.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Plain HTTP client for outbound calls (SNS confirmations).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
