//! Tenant domain types.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use bandsite_core::{Slug, TenantId};

/// A band site hosted on the platform.
#[derive(Debug, Clone, Serialize)]
pub struct Tenant {
    /// Unique tenant ID.
    pub id: TenantId,
    /// Subdomain label (`{slug}.{platform domain}`).
    pub slug: Slug,
    /// Band or artist name.
    pub name: String,
    /// Optional custom domain, lowercase without port.
    pub custom_domain: Option<String>,
    /// Inactive tenants resolve as unknown sites.
    pub active: bool,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The tenant resolved from the request host.
///
/// Inserted into request extensions by the tenant middleware.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Arc<Tenant>);

impl CurrentTenant {
    /// The tenant's ID.
    #[must_use]
    pub fn id(&self) -> TenantId {
        self.0.id
    }
}

impl std::ops::Deref for CurrentTenant {
    type Target = Tenant;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
