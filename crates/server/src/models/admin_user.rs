//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use bandsite_core::{AdminRole, AdminUserId, Email, TenantId};

/// An admin user (domain type).
///
/// Credentials (password hash, TOTP secret) are loaded separately and never
/// live on this type.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Tenant this admin manages.
    pub tenant_id: TenantId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// Whether TOTP two-factor authentication is on.
    pub totp_enabled: bool,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Profile returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub two_factor_enabled: bool,
    pub tenant: TenantSummary,
}

/// The tenant part of [`AdminProfile`].
#[derive(Debug, Clone, Serialize)]
pub struct TenantSummary {
    pub id: TenantId,
    pub slug: String,
    pub name: String,
}

/// A tracked admin login session.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSessionRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub admin_user_id: AdminUserId,
    /// tower-sessions record id, used to delete the session on revoke.
    #[serde(skip)]
    pub session_id: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}
