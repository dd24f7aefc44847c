//! Admin user repository for database operations.
//!
//! Covers admin users, their password hashes, TOTP state and recovery codes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::{AdminRole, AdminUserId, Email, TenantId};

use super::RepositoryError;
use crate::models::AdminUser;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    tenant_id: i32,
    email: String,
    name: String,
    role: AdminRole,
    totp_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            email,
            name: row.name,
            role: row.role,
            totp_enabled: row.totp_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotpRow {
    totp_secret: Option<Vec<u8>>,
    totp_enabled: bool,
    totp_last_step: Option<i64>,
}

/// Stored TOTP state for an admin.
#[derive(Debug, Clone)]
pub struct TotpState {
    pub secret: Option<Vec<u8>>,
    pub enabled: bool,
    pub last_step: Option<i64>,
}

const ADMIN_COLUMNS: &str =
    "id, tenant_id, email, name, role, totp_enabled, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row: Option<AdminUserRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS} FROM bandsite.admin_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a tenant's admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows: Vec<AdminUserRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS} FROM bandsite.admin_user WHERE tenant_id = $1 ORDER BY id"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin and their password hash by tenant and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        tenant_id: TenantId,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: AdminUserRow,
            password_hash: String,
        }

        let row: Option<Row> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM bandsite.admin_user \
             WHERE tenant_id = $1 AND email = $2"
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((row.user.try_into()?, row.password_hash))),
            None => Ok(None),
        }
    }

    /// Get an admin's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn get_password_hash(&self, id: AdminUserId) -> Result<String, RepositoryError> {
        sqlx::query_scalar("SELECT password_hash FROM bandsite.admin_user WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken within the tenant.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        email: &Email,
        name: &str,
        role: AdminRole,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let row: AdminUserRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.admin_user (tenant_id, email, name, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already registered for this site"))?;

        row.try_into()
    }

    /// Replace an admin's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn update_password(
        &self,
        id: AdminUserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE bandsite.admin_user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // TOTP
    // =========================================================================

    /// Get an admin's TOTP state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn get_totp(&self, id: AdminUserId) -> Result<TotpState, RepositoryError> {
        let row: TotpRow = sqlx::query_as(
            "SELECT totp_secret, totp_enabled, totp_last_step FROM bandsite.admin_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(TotpState {
            secret: row.totp_secret,
            enabled: row.totp_enabled,
            last_step: row.totp_last_step,
        })
    }

    /// Store a confirmed TOTP secret, enable 2FA and replace recovery codes.
    ///
    /// `step` is the step of the code that confirmed the secret, so that the
    /// same code cannot be used again to log in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn enable_totp(
        &self,
        id: AdminUserId,
        secret: &[u8],
        step: i64,
        recovery_code_hashes: &[String],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE bandsite.admin_user \
             SET totp_secret = $2, totp_enabled = TRUE, totp_last_step = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(secret)
        .bind(step)
        .execute(&mut *tx)
        .await?;

        replace_codes(&mut tx, id, recovery_code_hashes).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Turn 2FA off and delete the secret and recovery codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn disable_totp(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE bandsite.admin_user \
             SET totp_secret = NULL, totp_enabled = FALSE, totp_last_step = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bandsite.admin_recovery_code WHERE admin_user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Record `step` as used, if it is newer than the last accepted step.
    ///
    /// Returns `false` when the step was already used (replay).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn advance_totp_step(
        &self,
        id: AdminUserId,
        step: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bandsite.admin_user SET totp_last_step = $2 \
             WHERE id = $1 AND (totp_last_step IS NULL OR totp_last_step < $2)",
        )
        .bind(id)
        .bind(step)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Recovery Codes
    // =========================================================================

    /// Replace all recovery codes of an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace_recovery_codes(
        &self,
        id: AdminUserId,
        code_hashes: &[String],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        replace_codes(&mut tx, id, code_hashes).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Mark an unused recovery code as used.
    ///
    /// Returns `false` if no unused code with this hash exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume_recovery_code(
        &self,
        id: AdminUserId,
        code_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bandsite.admin_recovery_code SET used_at = NOW() \
             WHERE admin_user_id = $1 AND code_hash = $2 AND used_at IS NULL",
        )
        .bind(id)
        .bind(code_hash)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Number of recovery codes the admin has left.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_unused_recovery_codes(
        &self,
        id: AdminUserId,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bandsite.admin_recovery_code \
             WHERE admin_user_id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}

async fn replace_codes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: AdminUserId,
    code_hashes: &[String],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM bandsite.admin_recovery_code WHERE admin_user_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO bandsite.admin_recovery_code (admin_user_id, code_hash) \
         SELECT $1, UNNEST($2::text[])",
    )
    .bind(id)
    .bind(code_hashes)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
