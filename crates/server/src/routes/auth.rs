//! Admin authentication routes.
//!
//! Login is two-step when TOTP is enabled: the password check leaves a
//! [`PendingLogin`] in the session and `2fa/verify` completes it. Every
//! established login cycles the session id and gets an `admin_session` row,
//! which is what the session management endpoints list and revoke.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::{Session, SessionStore, session::Id};
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{ClientIp, RequireAdmin, RequireTenant};
use crate::models::{
    AdminProfile, AdminSessionRecord, AdminUser, CurrentAdmin, PendingLogin, PendingTotpSetup,
    session_keys,
};
use crate::services::auth::{LoginOutcome, TotpSetup};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Longest user agent stored on a session record.
const MAX_USER_AGENT_LENGTH: usize = 256;

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct DisableTwoFactorRequest {
    pub password: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Result of a login step.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Authenticated { admin: AdminProfile },
    TwoFactorRequired,
}

/// Fresh recovery codes, shown once.
#[derive(Debug, Serialize)]
pub struct RecoveryCodes {
    pub recovery_codes: Vec<String>,
}

/// A login session as listed to its owner.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub record: AdminSessionRecord,
    pub current: bool,
}

// =============================================================================
// Login / logout
// =============================================================================

/// Password login.
#[instrument(skip(state, tenant, session, headers, body), fields(tenant_id = %tenant.id()))]
pub async fn login(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    session: Session,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth = AuthService::new(state.pool());

    match auth.login(tenant.id(), &body.email, &body.password).await? {
        LoginOutcome::Authenticated(user) => {
            let client = ClientInfo::new(&headers, ip);
            establish_session(&session, &auth, &user, &client).await?;
            let admin = auth.profile(user.id, &tenant).await?;
            Ok(Json(LoginResponse::Authenticated { admin }))
        }
        LoginOutcome::TwoFactorRequired(user) => {
            session
                .insert(
                    session_keys::PENDING_LOGIN,
                    PendingLogin::new(user.id, tenant.id(), Utc::now()),
                )
                .await?;
            tracing::info!(admin_id = %user.id, "Password accepted, awaiting second factor");
            Ok(Json(LoginResponse::TwoFactorRequired))
        }
    }
}

/// Complete a login with a TOTP or recovery code.
#[instrument(skip(state, tenant, session, headers, body), fields(tenant_id = %tenant.id()))]
pub async fn verify_two_factor(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    session: Session,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(body): Json<CodeRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let mut pending: PendingLogin = session
        .get(session_keys::PENDING_LOGIN)
        .await?
        .ok_or(AuthError::LoginExpired)?;

    let auth = AuthService::new(state.pool());
    match auth
        .complete_two_factor(&mut pending, tenant.id(), &body.code, Utc::now())
        .await
    {
        Ok(user) => {
            let client = ClientInfo::new(&headers, ip);
            establish_session(&session, &auth, &user, &client).await?;
            let admin = auth.profile(user.id, &tenant).await?;
            Ok(Json(LoginResponse::Authenticated { admin }))
        }
        Err(AuthError::InvalidCode) => {
            session.insert(session_keys::PENDING_LOGIN, &pending).await?;
            Err(AuthError::InvalidCode.into())
        }
        Err(e @ (AuthError::LoginExpired | AuthError::TooManyAttempts)) => {
            session.remove_value(session_keys::PENDING_LOGIN).await?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out: revoke the session record and drop the session.
///
/// Succeeds without a login so clients can always clear state.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode, AppError> {
    if let Some(admin) = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?
    {
        match AuthService::new(state.pool())
            .revoke_session(admin.id, admin.session_record)
            .await
        {
            Ok(_) | Err(AuthError::SessionNotFound) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(admin_id = %admin.id, "Admin logged out");
    }

    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin's profile.
pub async fn me(
    State(state): State<AppState>,
    RequireAdmin { admin, tenant, .. }: RequireAdmin,
) -> Result<Json<AdminProfile>, AppError> {
    let profile = AuthService::new(state.pool())
        .profile(admin.id, &tenant)
        .await?;
    Ok(Json(profile))
}

/// Change password; every other session is revoked.
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let admin = &auth.admin;
    let revoked = AuthService::new(state.pool())
        .change_password(
            admin.id,
            &body.current_password,
            &body.new_password,
            admin.session_record,
        )
        .await?;

    delete_stored_sessions(&state, &revoked).await;
    tracing::info!(revoked = revoked.len(), "Password changed");

    Ok(Json(json!({ "success": true, "revoked_sessions": revoked.len() })))
}

// =============================================================================
// Two-factor management
// =============================================================================

/// Generate a TOTP secret and keep it in the session until confirmed.
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn setup_two_factor(
    State(state): State<AppState>,
    auth: RequireAdmin,
) -> Result<Json<TotpSetup>, AppError> {
    let RequireAdmin {
        admin,
        tenant,
        session,
    } = auth;

    let setup = AuthService::new(state.pool())
        .start_totp_setup(admin.id, admin.email.as_str(), &tenant.name)
        .await?;

    session
        .insert(
            session_keys::PENDING_TOTP_SETUP,
            PendingTotpSetup {
                secret: setup.secret.clone(),
            },
        )
        .await?;

    Ok(Json(setup))
}

/// Confirm the pending secret with a code and turn 2FA on.
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn enable_two_factor(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(body): Json<CodeRequest>,
) -> Result<Json<RecoveryCodes>, AppError> {
    let RequireAdmin {
        admin,
        tenant,
        session,
    } = auth;

    let pending: PendingTotpSetup = session
        .get(session_keys::PENDING_TOTP_SETUP)
        .await?
        .ok_or(AuthError::SetupMissing)?;

    let recovery_codes = AuthService::new(state.pool())
        .enable_totp(admin.id, &pending.secret, &body.code, Utc::now())
        .await?;
    session
        .remove_value(session_keys::PENDING_TOTP_SETUP)
        .await?;

    let email = state.email().clone();
    let to = admin.email.to_string();
    let name = admin.name.clone();
    let band_name = tenant.name.clone();
    tokio::spawn(async move {
        if let Err(e) = email.send_two_factor_enabled(&to, &name, &band_name).await {
            tracing::warn!(error = %e, "Failed to send two-factor enabled email");
        }
    });

    Ok(Json(RecoveryCodes { recovery_codes }))
}

/// Turn 2FA off (password and a current code required).
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn disable_two_factor(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(body): Json<DisableTwoFactorRequest>,
) -> Result<StatusCode, AppError> {
    AuthService::new(state.pool())
        .disable_totp(auth.admin.id, &body.password, &body.code, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace all recovery codes.
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn regenerate_recovery_codes(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(body): Json<CodeRequest>,
) -> Result<Json<RecoveryCodes>, AppError> {
    let recovery_codes = AuthService::new(state.pool())
        .regenerate_recovery_codes(auth.admin.id, &body.code, Utc::now())
        .await?;
    Ok(Json(RecoveryCodes { recovery_codes }))
}

// =============================================================================
// Session management
// =============================================================================

/// The admin's active sessions, flagging the one making this request.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: RequireAdmin,
) -> Result<Json<Vec<SessionView>>, AppError> {
    let current = auth.admin.session_record;
    let sessions = AuthService::new(state.pool())
        .list_sessions(auth.admin.id)
        .await?
        .into_iter()
        .map(|record| SessionView {
            current: record.id == current,
            record,
        })
        .collect();
    Ok(Json(sessions))
}

/// Revoke one session. Revoking the current one logs out.
#[instrument(skip_all, fields(admin_id = %auth.admin.id, session = %id))]
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let record = AuthService::new(state.pool())
        .revoke_session(auth.admin.id, id)
        .await?;

    if record.id == auth.admin.session_record {
        auth.session.flush().await?;
    } else {
        delete_stored_sessions(&state, std::slice::from_ref(&record)).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every session except the current one.
#[instrument(skip_all, fields(admin_id = %auth.admin.id))]
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    auth: RequireAdmin,
) -> Result<Json<Value>, AppError> {
    let revoked = AuthService::new(state.pool())
        .revoke_other_sessions(auth.admin.id, auth.admin.session_record)
        .await?;
    delete_stored_sessions(&state, &revoked).await;

    Ok(Json(json!({ "revoked_sessions": revoked.len() })))
}

// =============================================================================
// Helpers
// =============================================================================

/// Request details recorded on a new session.
struct ClientInfo {
    user_agent: Option<String>,
    ip: Option<String>,
}

impl ClientInfo {
    fn new(headers: &HeaderMap, ip: Option<std::net::IpAddr>) -> Self {
        Self {
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect()),
            ip: ip.map(|ip| ip.to_string()),
        }
    }
}

/// Turn a verified login into an authenticated session.
async fn establish_session(
    session: &Session,
    auth: &AuthService<'_>,
    user: &AdminUser,
    client: &ClientInfo,
) -> Result<(), AppError> {
    session.remove_value(session_keys::PENDING_LOGIN).await?;
    session.cycle_id().await?;
    session
        .insert(session_keys::LAST_SEEN_TOUCH, Utc::now().timestamp())
        .await?;
    session.save().await?;

    let session_id = session
        .id()
        .ok_or_else(|| AppError::Internal("session has no id after save".to_string()))?;

    let record = auth
        .record_session(
            user.id,
            &session_id.to_string(),
            client.user_agent.as_deref(),
            client.ip.as_deref(),
        )
        .await?;

    session
        .insert(
            session_keys::CURRENT_ADMIN,
            CurrentAdmin {
                id: user.id,
                tenant_id: user.tenant_id,
                email: user.email.clone(),
                name: user.name.clone(),
                role: user.role,
                session_record: record.id,
            },
        )
        .await?;

    tracing::info!(admin_id = %user.id, session_record = %record.id, "Admin logged in");
    Ok(())
}

/// Remove revoked sessions from the session store.
async fn delete_stored_sessions(state: &AppState, records: &[AdminSessionRecord]) {
    for record in records {
        let result = match Id::from_str(&record.session_id) {
            Ok(id) => state
                .sessions()
                .delete(&id)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            tracing::warn!(session_record = %record.id, error = %e, "Failed to delete stored session");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_login_response_shapes() {
        let json = serde_json::to_value(LoginResponse::TwoFactorRequired).unwrap();
        assert_eq!(json, json!({"status": "two_factor_required"}));
    }

    #[test]
    fn test_client_info_truncates_user_agent() {
        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_USER_AGENT_LENGTH + 50);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let client = ClientInfo::new(&headers, "203.0.113.9".parse().ok());
        assert_eq!(
            client.user_agent.map(|ua| ua.len()),
            Some(MAX_USER_AGENT_LENGTH)
        );
        assert_eq!(client.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_session_view_flattens_record() {
        let now = Utc::now();
        let view = SessionView {
            record: AdminSessionRecord {
                id: Uuid::nil(),
                admin_user_id: bandsite_core::AdminUserId::new(1),
                session_id: "secret-store-id".to_string(),
                user_agent: Some("Firefox".to_string()),
                ip_address: None,
                created_at: now,
                last_seen_at: now,
                revoked_at: None,
            },
            current: true,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["current"], true);
        assert_eq!(json["user_agent"], "Firefox");
        assert!(json.get("session_id").is_none());
    }
}
