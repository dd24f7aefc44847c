//! Database operations for the `bandsite` `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `tenant` - One row per band site (slug, custom domain, active flag)
//! - `theme`, `show_settings`, `contact_info`, `merch_config` - One row per tenant
//! - `show`, `spotify_player`, `video` - Tenant-owned lists
//! - `newsletter_subscriber` - Signups, unique per tenant and email
//! - `admin_user`, `admin_recovery_code`, `admin_session` - Admin auth
//!
//! Every repository method that reads or writes tenant-owned rows takes a
//! [`TenantId`](bandsite_core::TenantId) and filters by it.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bandsite-cli -- migrate
//! ```

pub mod admin_sessions;
pub mod admin_users;
pub mod contact;
pub mod merch;
pub mod newsletter;
pub mod players;
pub mod shows;
pub mod tenants;
pub mod themes;
pub mod videos;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_sessions::AdminSessionRepository;
pub use admin_users::AdminUserRepository;
pub use contact::ContactRepository;
pub use merch::MerchRepository;
pub use newsletter::SubscriberRepository;
pub use players::PlayerRepository;
pub use shows::ShowRepository;
pub use tenants::TenantRepository;
pub use themes::ThemeRepository;
pub use videos::VideoRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug or email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_string());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Rewrite `position` for a tenant's ordered list in one transaction.
///
/// `ids` must be exactly the tenant's current id set; anything else is
/// rejected with `Conflict` and nothing is written.
pub(crate) async fn reorder_positions(
    pool: &PgPool,
    table: &'static str,
    tenant_id: bandsite_core::TenantId,
    ids: &[i32],
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    let existing: Vec<i32> = sqlx::query_scalar(&format!(
        "SELECT id FROM bandsite.{table} WHERE tenant_id = $1 FOR UPDATE"
    ))
    .bind(tenant_id)
    .fetch_all(&mut *tx)
    .await?;

    if !same_id_set(&existing, ids) {
        return Err(RepositoryError::Conflict(
            "order must list every item exactly once".to_string(),
        ));
    }

    let positions: Vec<i32> = (0..).take(ids.len()).collect();
    sqlx::query(&format!(
        "UPDATE bandsite.{table} AS t SET position = v.position \
         FROM UNNEST($2::int4[], $3::int4[]) AS v(id, position) \
         WHERE t.id = v.id AND t.tenant_id = $1"
    ))
    .bind(tenant_id)
    .bind(ids)
    .bind(&positions)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Whether `requested` is a permutation of `existing`.
fn same_id_set(existing: &[i32], requested: &[i32]) -> bool {
    if existing.len() != requested.len() {
        return false;
    }
    let mut a = existing.to_vec();
    let mut b = requested.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_set_permutation() {
        assert!(same_id_set(&[1, 2, 3], &[3, 1, 2]));
        assert!(same_id_set(&[], &[]));
    }

    #[test]
    fn test_same_id_set_rejects_missing_or_extra() {
        assert!(!same_id_set(&[1, 2, 3], &[1, 2]));
        assert!(!same_id_set(&[1, 2], &[1, 2, 4]));
        assert!(!same_id_set(&[1, 2, 3], &[1, 1, 2]));
    }

    #[test]
    fn test_unique_violation_fallthrough() {
        let err = RepositoryError::from_unique(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
