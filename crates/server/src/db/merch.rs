//! Merch configuration repository.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::types::Json;

use bandsite_core::{MerchProvider, TenantId};

use super::RepositoryError;
use crate::models::MerchConfig;

#[derive(Debug, sqlx::FromRow)]
struct MerchRow {
    provider: MerchProvider,
    shopify_store_domain: Option<String>,
    shopify_storefront_token: Option<String>,
    shopify_collection_handle: Option<String>,
    stripe_publishable_key: Option<String>,
    stripe_buy_buttons: Json<Vec<String>>,
    updated_at: DateTime<Utc>,
}

impl From<MerchRow> for MerchConfig {
    fn from(row: MerchRow) -> Self {
        Self {
            provider: row.provider,
            shopify_store_domain: row.shopify_store_domain,
            shopify_storefront_token: row.shopify_storefront_token.map(SecretString::from),
            shopify_collection_handle: row.shopify_collection_handle,
            stripe_publishable_key: row.stripe_publishable_key,
            stripe_buy_buttons: row.stripe_buy_buttons.0,
            updated_at: Some(row.updated_at),
        }
    }
}

const MERCH_COLUMNS: &str = "provider, shopify_store_domain, shopify_storefront_token, \
    shopify_collection_handle, stripe_publishable_key, stripe_buy_buttons, updated_at";

/// Repository for tenant merch configuration.
pub struct MerchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MerchRepository<'a> {
    /// Create a new merch repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tenant's merch configuration; provider `none` when unset.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, tenant_id: TenantId) -> Result<MerchConfig, RepositoryError> {
        let row: Option<MerchRow> = sqlx::query_as(&format!(
            "SELECT {MERCH_COLUMNS} FROM bandsite.merch_config WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into).unwrap_or_default())
    }

    /// Insert or replace a tenant's merch configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        tenant_id: TenantId,
        config: &MerchConfig,
    ) -> Result<MerchConfig, RepositoryError> {
        let token = config
            .shopify_storefront_token
            .as_ref()
            .map(|t| t.expose_secret().to_string());

        let row: MerchRow = sqlx::query_as(&format!(
            r"
            INSERT INTO bandsite.merch_config (
                tenant_id, provider, shopify_store_domain, shopify_storefront_token,
                shopify_collection_handle, stripe_publishable_key, stripe_buy_buttons
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id) DO UPDATE SET
                provider = EXCLUDED.provider,
                shopify_store_domain = EXCLUDED.shopify_store_domain,
                shopify_storefront_token = EXCLUDED.shopify_storefront_token,
                shopify_collection_handle = EXCLUDED.shopify_collection_handle,
                stripe_publishable_key = EXCLUDED.stripe_publishable_key,
                stripe_buy_buttons = EXCLUDED.stripe_buy_buttons,
                updated_at = NOW()
            RETURNING {MERCH_COLUMNS}
            "
        ))
        .bind(tenant_id)
        .bind(config.provider)
        .bind(&config.shopify_store_domain)
        .bind(token)
        .bind(&config.shopify_collection_handle)
        .bind(&config.stripe_publishable_key)
        .bind(Json(&config.stripe_buy_buttons))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
