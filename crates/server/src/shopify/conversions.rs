//! Conversions from Storefront API responses to merch products.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::ShopifyError;
use super::queries::ProductNode;
use crate::models::MerchProduct;

/// Convert a product node, falling back to `https://{store}/products/{handle}`
/// when the product has no online store URL.
pub(super) fn convert_product(
    node: ProductNode,
    store_domain: &str,
) -> Result<MerchProduct, ShopifyError> {
    let money = node.price_range.min_variant_price;
    let price = Decimal::from_str(&money.amount).map_err(|e| {
        ShopifyError::InvalidData(format!("price '{}' for {}: {e}", money.amount, node.handle))
    })?;

    let url = node
        .online_store_url
        .unwrap_or_else(|| format!("https://{store_domain}/products/{}", node.handle));

    let (image_url, image_alt) = match node.featured_image {
        Some(image) => (Some(image.url), image.alt_text),
        None => (None, None),
    };

    Ok(MerchProduct {
        id: node.id,
        title: node.title,
        handle: node.handle,
        description: node.description,
        image_url,
        image_alt,
        price,
        currency: money.currency_code,
        available: node.available_for_sale,
        url,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::queries::{ImageNode, MoneyNode, PriceRangeNode};
    use super::*;

    fn node(amount: &str, online_store_url: Option<&str>) -> ProductNode {
        ProductNode {
            id: "gid://shopify/Product/1".to_string(),
            title: "Tour Tee".to_string(),
            handle: "tour-tee".to_string(),
            description: String::new(),
            available_for_sale: false,
            online_store_url: online_store_url.map(String::from),
            featured_image: Some(ImageNode {
                url: "https://cdn.shopify.com/tee.jpg".to_string(),
                alt_text: Some("Black tee".to_string()),
            }),
            price_range: PriceRangeNode {
                min_variant_price: MoneyNode {
                    amount: amount.to_string(),
                    currency_code: "EUR".to_string(),
                },
            },
        }
    }

    #[test]
    fn test_convert_product_fallback_url() {
        let product = convert_product(node("19.5", None), "owls.myshopify.com").unwrap();
        assert_eq!(product.url, "https://owls.myshopify.com/products/tour-tee");
        assert_eq!(product.price, Decimal::new(195, 1));
        assert_eq!(product.currency, "EUR");
        assert_eq!(product.image_alt.as_deref(), Some("Black tee"));
        assert!(!product.available);
    }

    #[test]
    fn test_convert_product_online_store_url() {
        let product = convert_product(
            node("25.00", Some("https://shop.owls.band/products/tour-tee")),
            "owls.myshopify.com",
        )
        .unwrap();
        assert_eq!(product.url, "https://shop.owls.band/products/tour-tee");
    }

    #[test]
    fn test_convert_product_bad_price() {
        let err = convert_product(node("free", None), "owls.myshopify.com").unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidData(_)));
    }
}
