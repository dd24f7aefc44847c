//! Tenant management commands.
//!
//! # Usage
//!
//! ```bash
//! bandsite-cli tenant create -s midnight-owls -n "Midnight Owls" [-d midnightowls.com]
//! bandsite-cli tenant list
//! bandsite-cli tenant deactivate -s midnight-owls
//! ```
//!
//! `--domain` is stored without a leading `www.` and must not be the platform
//! domain or one of its subdomains, so `BANDSITE_PLATFORM_DOMAIN` has to be set.

use bandsite_core::Slug;
use bandsite_server::db::{RepositoryError, TenantRepository};
use bandsite_server::tenancy::custom_domain_key;
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during tenant operations.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Invalid domain: {0} (must be a domain outside {1})")]
    InvalidDomain(String, String),

    #[error("Missing environment variable: BANDSITE_PLATFORM_DOMAIN (needed for --domain)")]
    MissingPlatformDomain,

    #[error("Name must not be empty")]
    EmptyName,

    #[error("A tenant already uses that slug or domain")]
    Exists,

    #[error("No tenant with slug: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for TenantError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::Exists,
            other => Self::Repository(other),
        }
    }
}

/// Validate `--domain` against `BANDSITE_PLATFORM_DOMAIN`.
fn parse_domain(raw: &str) -> Result<String, TenantError> {
    dotenvy::dotenv().ok();
    let platform = std::env::var("BANDSITE_PLATFORM_DOMAIN")
        .map_err(|_| TenantError::MissingPlatformDomain)?;
    domain_for_platform(raw, &platform)
}

/// Store custom domains in the form the host resolver looks up.
fn domain_for_platform(raw: &str, platform: &str) -> Result<String, TenantError> {
    let platform = platform.trim().trim_end_matches('.').to_lowercase();
    custom_domain_key(raw, &platform)
        .ok_or_else(|| TenantError::InvalidDomain(raw.to_owned(), platform))
}

/// Create a tenant and print where it is served.
pub async fn create(slug: &str, name: &str, domain: Option<&str>) -> Result<(), TenantError> {
    let slug = Slug::parse(slug).map_err(|e| TenantError::InvalidSlug(e.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(TenantError::EmptyName);
    }

    let domain = domain.map(parse_domain).transpose()?;

    let pool = connect().await?;
    let tenant = TenantRepository::new(&pool)
        .create(&slug, name, domain.as_deref())
        .await?;

    tracing::info!(
        "Tenant created! ID: {}, Slug: {}, Domain: {}",
        tenant.id,
        tenant.slug,
        tenant.custom_domain.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Print every tenant, newest first.
pub async fn list() -> Result<(), TenantError> {
    let pool = connect().await?;
    let tenants = TenantRepository::new(&pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:<6} {:<24} {:<8} {:<32} NAME", "ID", "SLUG", "ACTIVE", "DOMAIN");
        for t in &tenants {
            println!(
                "{:<6} {:<24} {:<8} {:<32} {}",
                t.id,
                t.slug,
                if t.active { "yes" } else { "no" },
                t.custom_domain.as_deref().unwrap_or("-"),
                t.name
            );
        }
    }
    Ok(())
}

/// Mark a tenant inactive so its hosts resolve as unknown sites.
pub async fn deactivate(slug: &str) -> Result<(), TenantError> {
    let pool = connect().await?;
    TenantRepository::new(&pool)
        .set_active(slug, false)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => TenantError::NotFound(slug.to_owned()),
            other => other.into(),
        })?;

    tracing::info!("Tenant {} deactivated", slug);
    Ok(())
}
