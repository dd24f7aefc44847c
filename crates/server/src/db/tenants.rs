//! Tenant repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::{Slug, TenantId};

use super::RepositoryError;
use crate::models::Tenant;

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: i32,
    slug: String,
    name: String,
    custom_domain: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = RepositoryError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tenant slug in database: {e}"))
        })?;

        Ok(Self {
            id: TenantId::new(row.id),
            slug,
            name: row.name,
            custom_domain: row.custom_domain,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TENANT_COLUMNS: &str = "id, slug, name, custom_domain, active, created_at, updated_at";

/// Repository for tenant lookups and management.
pub struct TenantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantRepository<'a> {
    /// Create a new tenant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {TENANT_COLUMNS} FROM bandsite.tenant WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a tenant by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {TENANT_COLUMNS} FROM bandsite.tenant WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a tenant by custom domain (lowercase, no port).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {TENANT_COLUMNS} FROM bandsite.tenant WHERE custom_domain = $1"
        ))
        .bind(domain)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all tenants, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let rows: Vec<TenantRow> = sqlx::query_as(&format!(
            "SELECT {TENANT_COLUMNS} FROM bandsite.tenant ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a new tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or domain is taken.
    pub async fn create(
        &self,
        slug: &Slug,
        name: &str,
        custom_domain: Option<&str>,
    ) -> Result<Tenant, RepositoryError> {
        let row: TenantRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.tenant (slug, name, custom_domain) \
             VALUES ($1, $2, $3) RETURNING {TENANT_COLUMNS}"
        ))
        .bind(slug)
        .bind(name)
        .bind(custom_domain)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug or domain already in use"))?;

        row.try_into()
    }

    /// Activate or deactivate a tenant by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no tenant has this slug.
    pub async fn set_active(&self, slug: &str, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE bandsite.tenant SET active = $2, updated_at = NOW() WHERE slug = $1",
        )
        .bind(slug)
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
