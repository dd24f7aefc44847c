//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bandsite_core::{AdminRole, AdminUserId, Email, TenantId};

/// How long a password-verified login waits for its second factor.
pub const PENDING_LOGIN_TTL_SECONDS: i64 = 5 * 60;

/// Second-factor attempts allowed before the pending login is discarded.
pub const MAX_TWO_FACTOR_ATTEMPTS: u8 = 5;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminUserId,
    /// Tenant the admin belongs to.
    pub tenant_id: TenantId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// `admin_session` row tracking this login.
    pub session_record: Uuid,
}

/// A login that passed the password check and waits for a TOTP or recovery code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub admin_id: AdminUserId,
    pub tenant_id: TenantId,
    pub expires_at: DateTime<Utc>,
    pub attempts: u8,
}

impl PendingLogin {
    /// Start a pending login that expires after [`PENDING_LOGIN_TTL_SECONDS`].
    #[must_use]
    pub fn new(admin_id: AdminUserId, tenant_id: TenantId, now: DateTime<Utc>) -> Self {
        Self {
            admin_id,
            tenant_id,
            expires_at: now + Duration::seconds(PENDING_LOGIN_TTL_SECONDS),
            attempts: 0,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Record a failed attempt. Returns `true` when no attempts remain.
    pub fn record_failure(&mut self) -> bool {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts >= MAX_TWO_FACTOR_ATTEMPTS
    }
}

/// A TOTP secret generated by `2fa/setup` and not yet confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTotpSetup {
    /// Base32-encoded secret (no padding).
    pub secret: String,
}

/// Session keys for admin authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for a login awaiting its second factor.
    pub const PENDING_LOGIN: &str = "pending_login";

    /// Key for an unconfirmed TOTP secret.
    pub const PENDING_TOTP_SETUP: &str = "pending_totp_setup";

    /// Key for the last time `admin_session.last_seen_at` was written.
    pub const LAST_SEEN_TOUCH: &str = "last_seen_touch";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_login_expiry() {
        let now = Utc::now();
        let pending = PendingLogin::new(AdminUserId::new(1), TenantId::new(1), now);
        assert!(!pending.is_expired(now));
        assert!(!pending.is_expired(now + Duration::seconds(299)));
        assert!(pending.is_expired(now + Duration::seconds(300)));
    }

    #[test]
    fn test_pending_login_attempt_limit() {
        let mut pending = PendingLogin::new(AdminUserId::new(1), TenantId::new(1), Utc::now());
        for _ in 0..4 {
            assert!(!pending.record_failure());
        }
        assert!(pending.record_failure());
    }
}
