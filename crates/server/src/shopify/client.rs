//! Storefront API client shared by all tenants.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use bandsite_core::TenantId;

use super::conversions::convert_product;
use super::queries::{
    COLLECTION_PRODUCTS, CollectionProductsData, CollectionProductsVariables, SHOP_PRODUCTS,
    ShopProductsData, ShopProductsVariables,
};
use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};
use crate::config::ShopifyConfig;
use crate::models::MerchProduct;

/// Most products shown in a merch section.
pub const MAX_PRODUCTS: i64 = 24;

/// How long a tenant's product list is cached.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

/// A tenant's Shopify store credentials.
#[derive(Debug, Clone)]
pub struct ShopifyStore {
    /// `{shop}.myshopify.com`
    pub domain: String,
    /// Storefront API access token.
    pub token: SecretString,
    /// Collection to list; the shop's best sellers when `None`.
    pub collection_handle: Option<String>,
}

/// Client for the Shopify Storefront API.
///
/// Product lists are cached per tenant for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    api_version: String,
    cache: Cache<TenantId, Arc<Vec<MerchProduct>>>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                api_version: config.api_version.clone(),
                cache,
            }),
        }
    }

    fn endpoint(&self, store: &ShopifyStore) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            store.domain, self.inner.api_version
        )
    }

    /// Execute a GraphQL query against a tenant's store.
    async fn execute<V, R>(
        &self,
        store: &ShopifyStore,
        query: &'static str,
        operation_name: &'static str,
        variables: V,
    ) -> Result<R, ShopifyError>
    where
        V: Serialize,
        R: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(self.endpoint(store))
            .header(
                "X-Shopify-Storefront-Access-Token",
                store.token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                store = %store.domain,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            ))]));
        }

        let response: Response<R> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    /// Products for a tenant's merch section, at most [`MAX_PRODUCTS`].
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the configured collection does not
    /// exist, or another `ShopifyError` if the API request fails.
    #[instrument(skip(self, store), fields(tenant_id = %tenant_id, store = %store.domain))]
    pub async fn products(
        &self,
        tenant_id: TenantId,
        store: &ShopifyStore,
    ) -> Result<Arc<Vec<MerchProduct>>, ShopifyError> {
        if let Some(products) = self.inner.cache.get(&tenant_id).await {
            debug!("Cache hit for merch products");
            return Ok(products);
        }

        let nodes = match &store.collection_handle {
            Some(handle) => {
                let data: CollectionProductsData = self
                    .execute(
                        store,
                        COLLECTION_PRODUCTS,
                        "CollectionProducts",
                        CollectionProductsVariables {
                            handle: handle.clone(),
                            first: MAX_PRODUCTS,
                        },
                    )
                    .await?;
                data.collection
                    .ok_or_else(|| ShopifyError::NotFound(format!("collection {handle}")))?
                    .products
                    .nodes
            }
            None => {
                let data: ShopProductsData = self
                    .execute(
                        store,
                        SHOP_PRODUCTS,
                        "ShopProducts",
                        ShopProductsVariables {
                            first: MAX_PRODUCTS,
                        },
                    )
                    .await?;
                data.products.nodes
            }
        };

        let products = nodes
            .into_iter()
            .map(|node| convert_product(node, &store.domain))
            .collect::<Result<Vec<_>, _>>()?;
        let products = Arc::new(products);

        self.inner
            .cache
            .insert(tenant_id, Arc::clone(&products))
            .await;

        Ok(products)
    }

    /// Drop a tenant's cached products (after a merch config change).
    pub async fn invalidate(&self, tenant_id: TenantId) {
        self.inner.cache.invalidate(&tenant_id).await;
    }
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ShopifyStore {
        ShopifyStore {
            domain: "owls.myshopify.com".to_string(),
            token: SecretString::from("token"),
            collection_handle: None,
        }
    }

    #[test]
    fn test_endpoint_uses_api_version() {
        let client = StorefrontClient::new(&ShopifyConfig {
            api_version: "2026-01".to_string(),
        });
        assert_eq!(
            client.endpoint(&store()),
            "https://owls.myshopify.com/api/2026-01/graphql.json"
        );
    }

    #[test]
    fn test_convert_graphql_error_path() {
        let err = graphql_client::Error {
            message: "Throttled".to_string(),
            locations: None,
            path: Some(vec![
                graphql_client::PathFragment::Key("products".to_string()),
                graphql_client::PathFragment::Index(2),
            ]),
            extensions: None,
        };
        let converted = convert_graphql_error(err);
        assert_eq!(converted.message, "Throttled");
        assert_eq!(converted.path.len(), 2);
        assert_eq!(converted.path[1], serde_json::json!(2));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_tenant_is_noop() {
        let client = StorefrontClient::new(&ShopifyConfig {
            api_version: "2026-01".to_string(),
        });
        client.invalidate(TenantId::new(1)).await;
        assert!(client.inner.cache.get(&TenantId::new(1)).await.is_none());
    }
}
