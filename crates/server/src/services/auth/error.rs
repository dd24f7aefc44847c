//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Wrong TOTP or recovery code, or a reused TOTP code.
    #[error("Invalid verification code")]
    InvalidCode,

    /// No pending login, or it expired.
    #[error("Login expired, please sign in again")]
    LoginExpired,

    /// Too many wrong codes for one pending login.
    #[error("Too many attempts, please sign in again")]
    TooManyAttempts,

    /// Operation requires 2FA to be enabled.
    #[error("Two-factor authentication is not enabled")]
    TwoFactorNotEnabled,

    /// 2FA is already on.
    #[error("Two-factor authentication is already enabled")]
    TwoFactorAlreadyEnabled,

    /// `enable` without a prior `setup` in this session.
    #[error("Start two-factor setup first")]
    SetupMissing,

    /// New password fails the password rules.
    #[error("{0}")]
    WeakPassword(String),

    /// Session record not found for this admin.
    #[error("Session not found")]
    SessionNotFound,

    /// Argon2 failure.
    #[error("password hashing error: {0}")]
    PasswordHash(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(e.to_string())
    }
}
