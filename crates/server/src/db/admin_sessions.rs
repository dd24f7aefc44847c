//! Tracked admin login sessions.
//!
//! Each successful login records a row here alongside the tower-sessions
//! record, so admins can list and revoke their sessions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bandsite_core::AdminUserId;

use super::RepositoryError;
use crate::models::AdminSessionRecord;

#[derive(Debug, sqlx::FromRow)]
struct AdminSessionRow {
    id: Uuid,
    admin_user_id: i32,
    session_id: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<AdminSessionRow> for AdminSessionRecord {
    fn from(row: AdminSessionRow) -> Self {
        Self {
            id: row.id,
            admin_user_id: AdminUserId::new(row.admin_user_id),
            session_id: row.session_id,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
            revoked_at: row.revoked_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, admin_user_id, session_id, user_agent, ip_address, \
                               created_at, last_seen_at, revoked_at";

/// Repository for admin session records.
pub struct AdminSessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminSessionRepository<'a> {
    /// Create a new admin session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a new login session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        admin_user_id: AdminUserId,
        session_id: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<AdminSessionRecord, RepositoryError> {
        let row: AdminSessionRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.admin_session (id, admin_user_id, session_id, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(admin_user_id)
        .bind(session_id)
        .bind(user_agent)
        .bind(ip_address)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a session record by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<AdminSessionRecord>, RepositoryError> {
        let row: Option<AdminSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM bandsite.admin_session WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List an admin's sessions that have not been revoked, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        admin_user_id: AdminUserId,
    ) -> Result<Vec<AdminSessionRecord>, RepositoryError> {
        let rows: Vec<AdminSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM bandsite.admin_session \
             WHERE admin_user_id = $1 AND revoked_at IS NULL \
             ORDER BY last_seen_at DESC"
        ))
        .bind(admin_user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Refresh `last_seen_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE bandsite.admin_session SET last_seen_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Revoke one of an admin's sessions. Returns the revoked record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the session is not the admin's
    /// or is already revoked.
    pub async fn revoke(
        &self,
        admin_user_id: AdminUserId,
        id: Uuid,
    ) -> Result<AdminSessionRecord, RepositoryError> {
        let row: Option<AdminSessionRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.admin_session SET revoked_at = NOW() \
             WHERE id = $1 AND admin_user_id = $2 AND revoked_at IS NULL \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(admin_user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Revoke all of an admin's sessions except `keep`. Returns the revoked records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_all_except(
        &self,
        admin_user_id: AdminUserId,
        keep: Uuid,
    ) -> Result<Vec<AdminSessionRecord>, RepositoryError> {
        let rows: Vec<AdminSessionRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.admin_session SET revoked_at = NOW() \
             WHERE admin_user_id = $1 AND id <> $2 AND revoked_at IS NULL \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(admin_user_id)
        .bind(keep)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
