//! Shopify Storefront API client for tenant merch.
//!
//! # Architecture
//!
//! - One shared client; each call names the tenant's store and token
//! - `graphql_client` request/response envelopes, `reqwest` 0.13 for HTTP
//! - Product lists cached per tenant via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use bandsite_server::shopify::{ShopifyStore, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify);
//! let store = ShopifyStore {
//!     domain: "midnight-owls.myshopify.com".to_string(),
//!     token: SecretString::from(token),
//!     collection_handle: Some("tour-merch".to_string()),
//! };
//! let products = client.products(tenant_id, &store).await?;
//! ```

mod client;
mod conversions;
pub mod queries;

pub use client::{ShopifyStore, StorefrontClient};

use thiserror::Error;

/// Errors that can occur when interacting with the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Shopify returned a value we could not interpret (e.g., a malformed price).
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("collection tour-merch".to_string());
        assert_eq!(err.to_string(), "Not found: collection tour-merch");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_empty_messages() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: products.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::GraphQL(vec![GraphQLError::message("")]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
