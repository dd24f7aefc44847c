//! Merch configuration and the public storefront.

use std::sync::LazyLock;

use regex::Regex;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bandsite_core::{MerchProvider, TenantId};

use super::validation::{ValidationError, non_empty};
use crate::db::{MerchRepository, RepositoryError};
use crate::models::{
    MerchConfig, MerchConfigInput, MerchConfigView, MerchStorefront, STRIPE_BUY_BUTTON_SCRIPT,
};
use crate::shopify::{ShopifyError, ShopifyStore, StorefrontClient};

/// Most Stripe buy buttons per tenant.
pub const MAX_BUY_BUTTONS: usize = 24;

static SHOPIFY_DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*\.myshopify\.com$").expect("Invalid regex")
});
static COLLECTION_HANDLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("Invalid regex"));
static STRIPE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pk_(live|test)_[A-Za-z0-9]+$").expect("Invalid regex"));
static BUY_BUTTON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^buy_btn_[A-Za-z0-9]+$").expect("Invalid regex"));

/// Errors from merch operations.
#[derive(Debug, Error)]
pub enum MerchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

fn matching(
    field: &'static str,
    value: Option<String>,
    pattern: &Regex,
    message: &str,
) -> Result<Option<String>, ValidationError> {
    match non_empty(value) {
        Some(v) if !pattern.is_match(&v) => Err(ValidationError::new(field, message)),
        other => Ok(other),
    }
}

/// Validate a merch update against the stored config.
///
/// Fields for either provider are validated when present; the chosen
/// provider's fields are required. An empty storefront token keeps the
/// stored one.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(
    input: MerchConfigInput,
    existing: &MerchConfig,
) -> Result<MerchConfig, ValidationError> {
    let shopify_store_domain = matching(
        "shopify_store_domain",
        input.shopify_store_domain.map(|d| d.to_ascii_lowercase()),
        &SHOPIFY_DOMAIN_REGEX,
        "must look like your-store.myshopify.com",
    )?;
    let shopify_storefront_token = non_empty(input.shopify_storefront_token)
        .map(SecretString::from)
        .or_else(|| existing.shopify_storefront_token.clone());
    let shopify_collection_handle = matching(
        "shopify_collection_handle",
        input.shopify_collection_handle,
        &COLLECTION_HANDLE_REGEX,
        "may only contain lowercase letters, digits and dashes",
    )?;
    let stripe_publishable_key = matching(
        "stripe_publishable_key",
        input.stripe_publishable_key,
        &STRIPE_KEY_REGEX,
        "must be a Stripe publishable key (pk_live_... or pk_test_...)",
    )?;

    let stripe_buy_buttons: Vec<String> = input
        .stripe_buy_buttons
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();
    if stripe_buy_buttons.len() > MAX_BUY_BUTTONS {
        return Err(ValidationError::new(
            "stripe_buy_buttons",
            format!("at most {MAX_BUY_BUTTONS} buy buttons are allowed"),
        ));
    }
    if let Some(bad) = stripe_buy_buttons
        .iter()
        .find(|b| !BUY_BUTTON_REGEX.is_match(b))
    {
        return Err(ValidationError::new(
            "stripe_buy_buttons",
            format!("'{bad}' is not a buy button id (buy_btn_...)"),
        ));
    }

    match input.provider {
        MerchProvider::None => {}
        MerchProvider::Shopify => {
            if shopify_store_domain.is_none() {
                return Err(ValidationError::new(
                    "shopify_store_domain",
                    "is required for Shopify",
                ));
            }
            if shopify_storefront_token.is_none() {
                return Err(ValidationError::new(
                    "shopify_storefront_token",
                    "is required for Shopify",
                ));
            }
        }
        MerchProvider::Stripe => {
            if stripe_publishable_key.is_none() {
                return Err(ValidationError::new(
                    "stripe_publishable_key",
                    "is required for Stripe",
                ));
            }
            if stripe_buy_buttons.is_empty() {
                return Err(ValidationError::new(
                    "stripe_buy_buttons",
                    "at least one buy button is required for Stripe",
                ));
            }
        }
    }

    Ok(MerchConfig {
        provider: input.provider,
        shopify_store_domain,
        shopify_storefront_token,
        shopify_collection_handle,
        stripe_publishable_key,
        stripe_buy_buttons,
        updated_at: None,
    })
}

/// The admin view of a tenant's merch config.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn get(pool: &PgPool, tenant_id: TenantId) -> Result<MerchConfigView, RepositoryError> {
    let config = MerchRepository::new(pool).get(tenant_id).await?;
    Ok(MerchConfigView::from(&config))
}

/// Validate and store a merch update, dropping cached products.
///
/// # Errors
///
/// Returns `MerchError::Validation` for bad input.
#[instrument(skip(pool, shopify, input), fields(tenant_id = %tenant_id))]
pub async fn update(
    pool: &PgPool,
    shopify: &StorefrontClient,
    tenant_id: TenantId,
    input: MerchConfigInput,
) -> Result<MerchConfigView, MerchError> {
    let repo = MerchRepository::new(pool);
    let existing = repo.get(tenant_id).await?;
    let config = validate(input, &existing)?;
    let saved = repo.upsert(tenant_id, &config).await?;

    shopify.invalidate(tenant_id).await;
    tracing::info!(provider = ?saved.provider, "Merch config updated");

    Ok(MerchConfigView::from(&saved))
}

/// What the public site shows in its merch section.
///
/// # Errors
///
/// Returns `MerchError::Shopify` if the Storefront API call fails.
pub async fn storefront(
    pool: &PgPool,
    shopify: &StorefrontClient,
    tenant_id: TenantId,
) -> Result<MerchStorefront, MerchError> {
    let config = MerchRepository::new(pool).get(tenant_id).await?;

    match config.provider {
        MerchProvider::None => Ok(MerchStorefront::None),
        MerchProvider::Stripe => match config.stripe_publishable_key {
            Some(publishable_key) => Ok(MerchStorefront::Stripe {
                publishable_key,
                buy_buttons: config.stripe_buy_buttons,
                script_url: STRIPE_BUY_BUTTON_SCRIPT,
            }),
            None => Ok(MerchStorefront::None),
        },
        MerchProvider::Shopify => {
            let (Some(domain), Some(token)) = (
                config.shopify_store_domain,
                config.shopify_storefront_token,
            ) else {
                return Ok(MerchStorefront::None);
            };
            let store = ShopifyStore {
                domain,
                token,
                collection_handle: config.shopify_collection_handle,
            };
            let products = shopify.products(tenant_id, &store).await?;
            Ok(MerchStorefront::Shopify {
                store_domain: store.domain,
                products: products.as_ref().clone(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn input(provider: MerchProvider) -> MerchConfigInput {
        MerchConfigInput {
            provider,
            shopify_store_domain: None,
            shopify_storefront_token: None,
            shopify_collection_handle: None,
            stripe_publishable_key: None,
            stripe_buy_buttons: vec![],
        }
    }

    #[test]
    fn test_none_provider_accepts_empty_input() {
        let config = validate(input(MerchProvider::None), &MerchConfig::default()).unwrap();
        assert_eq!(config.provider, MerchProvider::None);
        assert!(config.shopify_storefront_token.is_none());
    }

    #[test]
    fn test_shopify_requires_domain_and_token() {
        let mut shopify = input(MerchProvider::Shopify);
        shopify.shopify_store_domain = Some("Midnight-Owls.myshopify.com".to_string());
        let err = validate(shopify.clone(), &MerchConfig::default()).unwrap_err();
        assert_eq!(err.field, "shopify_storefront_token");

        shopify.shopify_storefront_token = Some("shpat_abc".to_string());
        let config = validate(shopify, &MerchConfig::default()).unwrap();
        assert_eq!(
            config.shopify_store_domain.as_deref(),
            Some("midnight-owls.myshopify.com")
        );
    }

    #[test]
    fn test_empty_token_keeps_existing() {
        let existing = MerchConfig {
            shopify_storefront_token: Some(SecretString::from("shpat_old")),
            ..MerchConfig::default()
        };
        let mut shopify = input(MerchProvider::Shopify);
        shopify.shopify_store_domain = Some("owls.myshopify.com".to_string());
        shopify.shopify_storefront_token = Some("  ".to_string());

        let config = validate(shopify, &existing).unwrap();
        assert_eq!(
            config
                .shopify_storefront_token
                .unwrap()
                .expose_secret(),
            "shpat_old"
        );
    }

    #[test]
    fn test_shopify_field_patterns() {
        let mut bad_domain = input(MerchProvider::Shopify);
        bad_domain.shopify_store_domain = Some("owls.example.com".to_string());
        assert_eq!(
            validate(bad_domain, &MerchConfig::default()).unwrap_err().field,
            "shopify_store_domain"
        );

        let mut bad_handle = input(MerchProvider::None);
        bad_handle.shopify_collection_handle = Some("Tour Merch".to_string());
        assert_eq!(
            validate(bad_handle, &MerchConfig::default()).unwrap_err().field,
            "shopify_collection_handle"
        );
    }

    #[test]
    fn test_stripe_rules() {
        let mut stripe = input(MerchProvider::Stripe);
        stripe.stripe_publishable_key = Some("sk_live_secret".to_string());
        assert_eq!(
            validate(stripe.clone(), &MerchConfig::default()).unwrap_err().field,
            "stripe_publishable_key"
        );

        stripe.stripe_publishable_key = Some("pk_live_51Abc".to_string());
        assert_eq!(
            validate(stripe.clone(), &MerchConfig::default()).unwrap_err().field,
            "stripe_buy_buttons"
        );

        stripe.stripe_buy_buttons = vec!["buy_btn_1Q2w3E".to_string(), "price_123".to_string()];
        assert!(validate(stripe.clone(), &MerchConfig::default()).is_err());

        stripe.stripe_buy_buttons = (0..=MAX_BUY_BUTTONS).map(|i| format!("buy_btn_{i}")).collect();
        assert!(validate(stripe.clone(), &MerchConfig::default()).is_err());

        stripe.stripe_buy_buttons = vec!["buy_btn_1Q2w3E".to_string()];
        let config = validate(stripe, &MerchConfig::default()).unwrap();
        assert_eq!(config.stripe_buy_buttons, vec!["buy_btn_1Q2w3E"]);
    }
}
