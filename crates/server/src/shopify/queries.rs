//! Storefront API queries and their response shapes.
//!
//! Only the product fields the merch section renders are requested.

use serde::{Deserialize, Serialize};

macro_rules! product_fields {
    () => {
        r"
fragment MerchProductFields on Product {
  id
  title
  handle
  description
  availableForSale
  onlineStoreUrl
  featuredImage { url altText }
  priceRange { minVariantPrice { amount currencyCode } }
}"
    };
}

/// Products of one collection, by handle.
pub const COLLECTION_PRODUCTS: &str = concat!(
    r"
query CollectionProducts($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    products(first: $first) { nodes { ...MerchProductFields } }
  }
}",
    product_fields!()
);

/// The shop's best-selling products.
pub const SHOP_PRODUCTS: &str = concat!(
    r"
query ShopProducts($first: Int!) {
  products(first: $first, sortKey: BEST_SELLING) { nodes { ...MerchProductFields } }
}",
    product_fields!()
);

/// Variables for [`COLLECTION_PRODUCTS`].
#[derive(Debug, Serialize)]
pub struct CollectionProductsVariables {
    pub handle: String,
    pub first: i64,
}

/// Variables for [`SHOP_PRODUCTS`].
#[derive(Debug, Serialize)]
pub struct ShopProductsVariables {
    pub first: i64,
}

#[derive(Debug, Deserialize)]
pub struct CollectionProductsData {
    pub collection: Option<CollectionNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionNode {
    pub products: ProductNodes,
}

#[derive(Debug, Deserialize)]
pub struct ShopProductsData {
    pub products: ProductNodes,
}

#[derive(Debug, Deserialize)]
pub struct ProductNodes {
    pub nodes: Vec<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub available_for_sale: bool,
    pub online_store_url: Option<String>,
    pub featured_image: Option<ImageNode>,
    pub price_range: PriceRangeNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    /// Decimal string, e.g. `"25.0"`.
    pub amount: String,
    pub currency_code: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_share_fragment() {
        assert!(COLLECTION_PRODUCTS.ends_with(product_fields!()));
        assert!(SHOP_PRODUCTS.ends_with(product_fields!()));
        assert!(COLLECTION_PRODUCTS.contains("query CollectionProducts("));
    }

    #[test]
    fn test_deserialize_collection_response() {
        let json = serde_json::json!({
            "collection": {
                "products": {
                    "nodes": [{
                        "id": "gid://shopify/Product/1",
                        "title": "Tour Tee",
                        "handle": "tour-tee",
                        "description": "Black cotton tee",
                        "availableForSale": true,
                        "onlineStoreUrl": null,
                        "featuredImage": {"url": "https://cdn.shopify.com/tee.jpg", "altText": null},
                        "priceRange": {"minVariantPrice": {"amount": "25.0", "currencyCode": "USD"}}
                    }]
                }
            }
        });

        let data: CollectionProductsData = serde_json::from_value(json).unwrap();
        let products = data.collection.unwrap().products.nodes;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_range.min_variant_price.currency_code, "USD");
        assert!(products[0].available_for_sale);
    }
}
