//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! bandsite-cli admin create -t midnight-owls -e owner@example.com -n "Sam" -r owner
//! bandsite-cli admin list -t midnight-owls
//! ```
//!
//! # Environment Variables
//!
//! - `BANDSITE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `BANDSITE_ADMIN_PASSWORD` - Initial password. When unset a random one is
//!   generated and printed once.

use bandsite_core::{AdminRole, Email};
use bandsite_server::db::{AdminUserRepository, RepositoryError, TenantRepository};
use bandsite_server::services::{AuthError, AuthService};
use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use super::{ConnectError, connect};

/// Length of a generated initial password.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: owner, editor")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No tenant with slug: {0}")]
    UnknownTenant(String),

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Auth(AuthError),
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Admins log in with the normalized address, so store it that way.
fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::normalized(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

/// Create a new admin user for a tenant.
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(
    tenant_slug: &str,
    email: &str,
    name: &str,
    role: &str,
) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = parse_email(email)?;

    let (password, generated) = match std::env::var("BANDSITE_ADMIN_PASSWORD") {
        Ok(password) => (password, false),
        Err(_) => (generate_password(), true),
    };

    let pool = connect().await?;
    let tenant = TenantRepository::new(&pool)
        .get_by_slug(tenant_slug)
        .await?
        .ok_or_else(|| AdminError::UnknownTenant(tenant_slug.to_owned()))?;

    tracing::info!("Creating admin user: {} ({}) for {}", email, role, tenant.slug);

    let user = AuthService::new(&pool)
        .create_admin(tenant.id, &email, name.trim(), role, &password)
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::Conflict(_)) => {
                AdminError::UserExists(email.to_string())
            }
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        email,
        role
    );

    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password (shown once): {password}");
        }
    }

    Ok(user.id.as_i32())
}

/// Print a tenant's admins.
pub async fn list_users(tenant_slug: &str) -> Result<(), AdminError> {
    let pool = connect().await?;
    let tenant = TenantRepository::new(&pool)
        .get_by_slug(tenant_slug)
        .await?
        .ok_or_else(|| AdminError::UnknownTenant(tenant_slug.to_owned()))?;
    let admins = AdminUserRepository::new(&pool)
        .list_by_tenant(tenant.id)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:<6} {:<8} {:<4} {:<32} NAME", "ID", "ROLE", "2FA", "EMAIL");
        for a in &admins {
            println!(
                "{:<6} {:<8} {:<4} {:<32} {}",
                a.id,
                a.role,
                if a.totp_enabled { "on" } else { "off" },
                a.email,
                a.name
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_is_alphanumeric() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }

    #[test]
    fn test_email_is_stored_in_login_form() {
        let email = parse_email(" Owner@MidnightOwls.com").unwrap();
        assert_eq!(email.as_str(), "owner@midnightowls.com");
        assert_eq!(
            email,
            Email::normalized("OWNER@midnightowls.com").unwrap()
        );
        assert!(matches!(
            parse_email("owner"),
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
