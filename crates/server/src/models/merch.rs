//! Merch storefront types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use bandsite_core::MerchProvider;

/// Script that renders `<stripe-buy-button>` elements.
pub const STRIPE_BUY_BUTTON_SCRIPT: &str = "https://js.stripe.com/v3/buy-button.js";

/// A tenant's merch configuration, including credentials.
///
/// Never serialized directly; admin responses go through [`MerchConfigView`].
#[derive(Debug, Clone, Default)]
pub struct MerchConfig {
    pub provider: MerchProvider,
    pub shopify_store_domain: Option<String>,
    pub shopify_storefront_token: Option<SecretString>,
    pub shopify_collection_handle: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_buy_buttons: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Admin-facing view of [`MerchConfig`] that hides the storefront token.
#[derive(Debug, Clone, Serialize)]
pub struct MerchConfigView {
    pub provider: MerchProvider,
    pub shopify_store_domain: Option<String>,
    pub has_storefront_token: bool,
    pub shopify_collection_handle: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_buy_buttons: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&MerchConfig> for MerchConfigView {
    fn from(config: &MerchConfig) -> Self {
        Self {
            provider: config.provider,
            shopify_store_domain: config.shopify_store_domain.clone(),
            has_storefront_token: config.shopify_storefront_token.is_some(),
            shopify_collection_handle: config.shopify_collection_handle.clone(),
            stripe_publishable_key: config.stripe_publishable_key.clone(),
            stripe_buy_buttons: config.stripe_buy_buttons.clone(),
            updated_at: config.updated_at,
        }
    }
}

/// Update payload for the merch configuration.
///
/// An absent or empty `shopify_storefront_token` keeps the stored token.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchConfigInput {
    pub provider: MerchProvider,
    #[serde(default)]
    pub shopify_store_domain: Option<String>,
    #[serde(default)]
    pub shopify_storefront_token: Option<String>,
    #[serde(default)]
    pub shopify_collection_handle: Option<String>,
    #[serde(default)]
    pub stripe_publishable_key: Option<String>,
    #[serde(default)]
    pub stripe_buy_buttons: Vec<String>,
}

/// A product shown on the public merch section.
#[derive(Debug, Clone, Serialize)]
pub struct MerchProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub available: bool,
    /// Where "Buy" sends the visitor.
    pub url: String,
}

/// What the public site renders for merch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum MerchStorefront {
    None,
    Shopify {
        store_domain: String,
        products: Vec<MerchProduct>,
    },
    Stripe {
        publishable_key: String,
        buy_buttons: Vec<String>,
        script_url: &'static str,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_view_hides_token() {
        let config = MerchConfig {
            provider: MerchProvider::Shopify,
            shopify_store_domain: Some("owls.myshopify.com".to_string()),
            shopify_storefront_token: Some(SecretString::from("shpat_abc123")),
            ..MerchConfig::default()
        };

        let json = serde_json::to_string(&MerchConfigView::from(&config)).unwrap();
        assert!(json.contains("\"has_storefront_token\":true"));
        assert!(!json.contains("shpat_abc123"));
    }

    #[test]
    fn test_storefront_tagged_by_provider() {
        let json = serde_json::to_value(MerchStorefront::None).unwrap();
        assert_eq!(json, serde_json::json!({"provider": "none"}));

        let json = serde_json::to_value(MerchStorefront::Stripe {
            publishable_key: "pk_test_abc".to_string(),
            buy_buttons: vec!["buy_btn_1".to_string()],
            script_url: STRIPE_BUY_BUTTON_SCRIPT,
        })
        .unwrap();
        assert_eq!(json["provider"], "stripe");
        assert_eq!(json["script_url"], STRIPE_BUY_BUTTON_SCRIPT);
    }
}
