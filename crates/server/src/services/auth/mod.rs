//! Admin authentication service.
//!
//! Password login with optional TOTP two-factor authentication, recovery
//! codes and per-login session records.
//!
//! Session cookie handling (cycling the id, storing [`CurrentAdmin`]) lives in
//! the route layer; this service owns the checks and the database writes.
//!
//! [`CurrentAdmin`]: crate::models::CurrentAdmin

mod error;
pub mod totp;

pub use error::AuthError;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use bandsite_core::{AdminRole, AdminUserId, Email, TenantId};

use crate::db::{AdminSessionRepository, AdminUserRepository, RepositoryError};
use crate::models::{AdminProfile, AdminSessionRecord, AdminUser, PendingLogin, Tenant, TenantSummary};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 10;
/// Maximum password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 256;

/// Hash a password with Argon2id and a random salt (PHC string format).
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Check a new password against the password rules.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the failed rule.
pub fn validate_new_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    if password.trim().is_empty() {
        return Err(AuthError::WeakPassword(
            "Password must not be blank".to_string(),
        ));
    }
    Ok(())
}

/// The stored form of an email typed at the login form.
fn login_key(email: &str) -> Option<Email> {
    Email::normalized(email).ok()
}

/// A pending login is only usable on the site it started on, before it expires.
fn check_pending(
    pending: &PendingLogin,
    tenant_id: TenantId,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if pending.tenant_id != tenant_id || pending.is_expired(now) {
        return Err(AuthError::LoginExpired);
    }
    Ok(())
}

/// Count a wrong code against the pending login.
fn wrong_code(pending: &mut PendingLogin) -> AuthError {
    if pending.record_failure() {
        tracing::warn!("Too many two-factor attempts, discarding pending login");
        AuthError::TooManyAttempts
    } else {
        AuthError::InvalidCode
    }
}

/// Result of the password step of a login.
#[derive(Debug)]
pub enum LoginOutcome {
    /// No 2FA: the session can be established.
    Authenticated(AdminUser),
    /// 2FA enabled: a code is needed before the session is established.
    TwoFactorRequired(AdminUser),
}

/// Which second factor was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondFactor {
    Totp,
    RecoveryCode,
}

/// A new TOTP secret awaiting confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct TotpSetup {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `otpauth://` URI for QR codes.
    pub otpauth_uri: String,
}

/// Admin authentication service.
pub struct AuthService<'a> {
    users: AdminUserRepository<'a>,
    sessions: AdminSessionRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
            sessions: AdminSessionRepository::new(pool),
        }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Check an email and password for a tenant.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password alike.
    #[instrument(skip(self, email, password), fields(tenant_id = %tenant_id))]
    pub async fn login(
        &self,
        tenant_id: TenantId,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let found = match login_key(email) {
            Some(email) => self.users.get_with_password_hash(tenant_id, &email).await?,
            None => None,
        };

        let Some((user, hash)) = found else {
            // Spend the same time as a real verification.
            let _ = hash_password(password);
            tracing::info!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &hash)? {
            tracing::info!(admin_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if user.totp_enabled {
            Ok(LoginOutcome::TwoFactorRequired(user))
        } else {
            Ok(LoginOutcome::Authenticated(user))
        }
    }

    /// Finish a login with a TOTP or recovery code.
    ///
    /// On `InvalidCode` the caller must store the updated `pending` back in
    /// the session; on `LoginExpired` or `TooManyAttempts` it must discard it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginExpired` if the pending login expired or
    /// belongs to another tenant, `AuthError::TooManyAttempts` on the fifth
    /// wrong code, `AuthError::InvalidCode` for other wrong codes.
    #[instrument(skip(self, pending, code), fields(admin_id = %pending.admin_id))]
    pub async fn complete_two_factor(
        &self,
        pending: &mut PendingLogin,
        tenant_id: TenantId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminUser, AuthError> {
        check_pending(pending, tenant_id, now)?;

        match self.verify_second_factor(pending.admin_id, code, now).await {
            Ok(factor) => {
                tracing::info!(factor = ?factor, "Second factor accepted");
                self.users
                    .get_by_id(pending.admin_id)
                    .await?
                    .ok_or(AuthError::LoginExpired)
            }
            Err(AuthError::InvalidCode) => Err(wrong_code(pending)),
            Err(e) => Err(e),
        }
    }

    /// Accept a current TOTP code or consume an unused recovery code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TwoFactorNotEnabled` if the admin has no TOTP secret,
    /// `AuthError::InvalidCode` if the code is wrong or was already used.
    pub async fn verify_second_factor(
        &self,
        admin_id: AdminUserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<SecondFactor, AuthError> {
        let code = code.trim();
        let state = self.users.get_totp(admin_id).await?;
        let Some(secret) = state.secret.filter(|_| state.enabled) else {
            return Err(AuthError::TwoFactorNotEnabled);
        };

        if totp::is_totp_code(code) {
            let step =
                totp::verify(&secret, code, now.timestamp()).ok_or(AuthError::InvalidCode)?;
            if !self.users.advance_totp_step(admin_id, step).await? {
                tracing::warn!(admin_id = %admin_id, "Rejected reused TOTP code");
                return Err(AuthError::InvalidCode);
            }
            return Ok(SecondFactor::Totp);
        }

        let normalized = totp::normalize_recovery_code(code).ok_or(AuthError::InvalidCode)?;
        let hash = totp::hash_recovery_code(&normalized);
        if self.users.consume_recovery_code(admin_id, &hash).await? {
            let remaining = self.users.count_unused_recovery_codes(admin_id).await?;
            tracing::info!(admin_id = %admin_id, remaining, "Recovery code used");
            Ok(SecondFactor::RecoveryCode)
        } else {
            Err(AuthError::InvalidCode)
        }
    }

    // =========================================================================
    // Two-factor management
    // =========================================================================

    /// Generate a new TOTP secret. Nothing is stored until [`Self::enable_totp`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TwoFactorAlreadyEnabled` if 2FA is already on.
    pub async fn start_totp_setup(
        &self,
        admin_id: AdminUserId,
        account: &str,
        issuer: &str,
    ) -> Result<TotpSetup, AuthError> {
        if self.users.get_totp(admin_id).await?.enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let secret = totp::encode_secret(&totp::generate_secret());
        let otpauth_uri = totp::otpauth_uri(issuer, account, &secret);
        Ok(TotpSetup {
            secret,
            otpauth_uri,
        })
    }

    /// Confirm a TOTP secret with a code and turn 2FA on.
    ///
    /// Returns the new recovery codes in plain text; only their hashes are
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` if the code does not match the secret,
    /// `AuthError::TwoFactorAlreadyEnabled` if 2FA is already on.
    #[instrument(skip(self, secret_b32, code))]
    pub async fn enable_totp(
        &self,
        admin_id: AdminUserId,
        secret_b32: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AuthError> {
        if self.users.get_totp(admin_id).await?.enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let secret = totp::decode_secret(secret_b32).ok_or(AuthError::SetupMissing)?;
        let step =
            totp::verify(&secret, code.trim(), now.timestamp()).ok_or(AuthError::InvalidCode)?;

        let codes = totp::generate_recovery_codes();
        let hashes: Vec<String> = codes.iter().map(|c| totp::hash_recovery_code(c)).collect();
        self.users
            .enable_totp(admin_id, &secret, step, &hashes)
            .await?;

        tracing::info!(admin_id = %admin_id, "Two-factor authentication enabled");
        Ok(codes)
    }

    /// Turn 2FA off. Requires the password and a current code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong password,
    /// `AuthError::InvalidCode` for a wrong code.
    #[instrument(skip(self, password, code))]
    pub async fn disable_totp(
        &self,
        admin_id: AdminUserId,
        password: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.check_password(admin_id, password).await?;
        self.verify_second_factor(admin_id, code, now).await?;
        self.users.disable_totp(admin_id).await?;

        tracing::info!(admin_id = %admin_id, "Two-factor authentication disabled");
        Ok(())
    }

    /// Replace all recovery codes after checking a current code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` for a wrong code,
    /// `AuthError::TwoFactorNotEnabled` if 2FA is off.
    #[instrument(skip(self, code))]
    pub async fn regenerate_recovery_codes(
        &self,
        admin_id: AdminUserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AuthError> {
        self.verify_second_factor(admin_id, code, now).await?;

        let codes = totp::generate_recovery_codes();
        let hashes: Vec<String> = codes.iter().map(|c| totp::hash_recovery_code(c)).collect();
        self.users.replace_recovery_codes(admin_id, &hashes).await?;

        Ok(codes)
    }

    // =========================================================================
    // Password
    // =========================================================================

    async fn check_password(&self, admin_id: AdminUserId, password: &str) -> Result<(), AuthError> {
        let hash = match self.users.get_password_hash(admin_id).await {
            Ok(hash) => hash,
            Err(RepositoryError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        if verify_password(password, &hash)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Change the password and revoke every other session.
    ///
    /// Returns the revoked session records so their session store entries
    /// can be deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong current password,
    /// `AuthError::WeakPassword` if the new one fails the rules.
    #[instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        admin_id: AdminUserId,
        current: &str,
        new: &str,
        keep_session: Uuid,
    ) -> Result<Vec<AdminSessionRecord>, AuthError> {
        self.check_password(admin_id, current).await?;
        validate_new_password(new)?;

        let hash = hash_password(new)?;
        self.users.update_password(admin_id, &hash).await?;
        let revoked = self
            .sessions
            .revoke_all_except(admin_id, keep_session)
            .await?;

        tracing::info!(admin_id = %admin_id, revoked = revoked.len(), "Password changed");
        Ok(revoked)
    }

    /// Create an admin with a validated password.
    ///
    /// The email is stored in the form [`Self::login`] looks up.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or a repository `Conflict` for a
    /// duplicate email.
    pub async fn create_admin(
        &self,
        tenant_id: TenantId,
        email: &Email,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        validate_new_password(password)?;
        let hash = hash_password(password)?;
        Ok(self
            .users
            .create(tenant_id, &email.to_normalized(), name, role, &hash)
            .await?)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Record a newly established login session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn record_session(
        &self,
        admin_id: AdminUserId,
        session_id: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<AdminSessionRecord, AuthError> {
        Ok(self
            .sessions
            .create(admin_id, session_id, user_agent, ip_address)
            .await?)
    }

    /// The session record, if it belongs to `admin_id` and is not revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn active_session(
        &self,
        admin_id: AdminUserId,
        record_id: Uuid,
    ) -> Result<Option<AdminSessionRecord>, AuthError> {
        Ok(self
            .sessions
            .get(record_id)
            .await?
            .filter(|s| s.admin_user_id == admin_id && s.revoked_at.is_none()))
    }

    /// Refresh a session's `last_seen_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn touch_session(&self, record_id: Uuid) -> Result<(), AuthError> {
        Ok(self.sessions.touch(record_id).await?)
    }

    /// Active sessions of an admin, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn list_sessions(
        &self,
        admin_id: AdminUserId,
    ) -> Result<Vec<AdminSessionRecord>, AuthError> {
        Ok(self.sessions.list_active(admin_id).await?)
    }

    /// Revoke one of the admin's sessions.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionNotFound` if it is not the admin's or was
    /// already revoked.
    pub async fn revoke_session(
        &self,
        admin_id: AdminUserId,
        record_id: Uuid,
    ) -> Result<AdminSessionRecord, AuthError> {
        match self.sessions.revoke(admin_id, record_id).await {
            Ok(record) => Ok(record),
            Err(RepositoryError::NotFound) => Err(AuthError::SessionNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke every session except `keep`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn revoke_other_sessions(
        &self,
        admin_id: AdminUserId,
        keep: Uuid,
    ) -> Result<Vec<AdminSessionRecord>, AuthError> {
        Ok(self.sessions.revoke_all_except(admin_id, keep).await?)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// The admin's profile for `/api/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` with `NotFound` if the admin was deleted.
    pub async fn profile(
        &self,
        admin_id: AdminUserId,
        tenant: &Tenant,
    ) -> Result<AdminProfile, AuthError> {
        let user = self
            .users
            .get_by_id(admin_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(AdminProfile {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            two_factor_enabled: user.totp_enabled,
            tenant: TenantSummary {
                id: tenant.id,
                slug: tenant.slug.to_string(),
                name: tenant.name.clone(),
            },
        })
    }
}
