//! Public band site: the server-rendered homepage and theme stylesheet.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::db::{ContactRepository, PlayerRepository, VideoRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireTenant;
use crate::models::{
    BandsintownWidget, ContactInfo, MerchProduct, MerchStorefront, PublicShows, Show,
    SpotifyPlayer, Theme, Video,
};
use crate::services::{merch, shows, theme};
use crate::state::AppState;

/// `Cache-Control` for the theme stylesheet.
const THEME_CSS_CACHE_CONTROL: &str = "public, max-age=300";

// =============================================================================
// View types
// =============================================================================

/// A show as the homepage lists it.
#[derive(Clone)]
pub struct ShowView {
    pub date_label: String,
    pub iso_date: String,
    pub doors_label: Option<String>,
    pub venue: String,
    pub location: String,
    pub ticket_url: Option<String>,
    pub sold_out: bool,
    pub notes: Option<String>,
}

impl From<&Show> for ShowView {
    fn from(show: &Show) -> Self {
        let location = [Some(show.city.as_str()), show.region.as_deref(), Some(show.country.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            date_label: show.date.format("%a %-d %b %Y").to_string(),
            iso_date: show.date.to_string(),
            doors_label: show
                .doors_time
                .map(|t| format!("Doors {}", t.format("%-I:%M %p"))),
            venue: show.venue.clone(),
            location,
            ticket_url: show.ticket_url.clone(),
            sold_out: show.sold_out,
            notes: show.notes.clone(),
        }
    }
}

/// A Shopify product card.
#[derive(Clone)]
pub struct ProductCard {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub image_alt: String,
    pub price_label: String,
    pub available: bool,
}

impl From<&MerchProduct> for ProductCard {
    fn from(product: &MerchProduct) -> Self {
        Self {
            title: product.title.clone(),
            url: product.url.clone(),
            image_url: product.image_url.clone(),
            image_alt: product
                .image_alt
                .clone()
                .unwrap_or_else(|| product.title.clone()),
            price_label: price_label(product.price, &product.currency),
            available: product.available,
        }
    }
}

/// Stripe buy buttons block.
#[derive(Clone)]
pub struct StripeButtons {
    pub publishable_key: String,
    pub buy_buttons: Vec<String>,
    pub script_url: &'static str,
}

/// Format a price with two decimals and its currency code.
fn price_label(price: Decimal, currency: &str) -> String {
    let mut price = price.round_dp(2);
    price.rescale(2);
    format!("{price} {currency}")
}

// =============================================================================
// Homepage
// =============================================================================

/// Homepage template.
#[derive(Template, WebTemplate)]
#[template(path = "site/home.html")]
pub struct HomeTemplate {
    pub band_name: String,
    pub theme: Theme,
    pub fonts_url: String,
    pub upcoming: Vec<ShowView>,
    pub bandsintown: Option<BandsintownWidget>,
    pub players: Vec<SpotifyPlayer>,
    pub videos: Vec<Video>,
    pub products: Vec<ProductCard>,
    pub shop_url: Option<String>,
    pub stripe: Option<StripeButtons>,
    pub contact: ContactInfo,
    pub social_links: Vec<(&'static str, String)>,
}

/// Render the tenant homepage.
///
/// Merch is best effort: a Storefront API failure is logged and the page
/// renders without products.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn home(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<HomeTemplate, AppError> {
    let pool = state.pool();
    let tenant_id = tenant.id();

    let theme = theme::load(pool, tenant_id).await?;
    let listing = shows::public_listing(pool, tenant_id, shows::today()).await?;
    let players = PlayerRepository::new(pool).list(tenant_id).await?;
    let videos = VideoRepository::new(pool).list(tenant_id).await?;
    let contact = ContactRepository::new(pool).get(tenant_id).await?;

    let merch = match merch::storefront(pool, state.storefront(), tenant_id).await {
        Ok(merch) => merch,
        Err(e) => {
            tracing::warn!(error = %e, "Merch unavailable, rendering homepage without it");
            MerchStorefront::None
        }
    };

    let (upcoming, bandsintown) = match listing {
        PublicShows::Manual { upcoming, .. } => (upcoming.iter().map(ShowView::from).collect(), None),
        PublicShows::Bandsintown { widget } => (Vec::new(), Some(widget)),
    };

    let (products, shop_url, stripe) = match merch {
        MerchStorefront::None => (Vec::new(), None, None),
        MerchStorefront::Shopify {
            store_domain,
            products,
        } => (
            products.iter().map(ProductCard::from).collect(),
            Some(format!("https://{store_domain}")),
            None,
        ),
        MerchStorefront::Stripe {
            publishable_key,
            buy_buttons,
            script_url,
        } => (
            Vec::new(),
            None,
            Some(StripeButtons {
                publishable_key,
                buy_buttons,
                script_url,
            }),
        ),
    };

    let social_links = contact
        .social_links()
        .into_iter()
        .map(|(label, url)| (label, url.to_string()))
        .collect();

    Ok(HomeTemplate {
        band_name: tenant.name.clone(),
        fonts_url: theme::fonts_stylesheet_url(&theme),
        theme,
        upcoming,
        bandsintown,
        players,
        videos,
        products,
        shop_url,
        stripe,
        contact,
        social_links,
    })
}

// =============================================================================
// Theme stylesheet
// =============================================================================

/// Serve the tenant theme as CSS custom properties.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn theme_css(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Response, AppError> {
    let theme = theme::load(state.pool(), tenant.id()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, THEME_CSS_CACHE_CONTROL),
        ],
        theme::css_variables(&theme),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::{NaiveDate, NaiveTime, Utc};

    use bandsite_core::ShowId;

    use super::*;

    #[test]
    fn test_price_label_two_decimals() {
        assert_eq!(price_label(Decimal::from(25), "USD"), "25.00 USD");
        assert_eq!(
            price_label(Decimal::from_str("19.999").unwrap(), "EUR"),
            "20.00 EUR"
        );
        assert_eq!(
            price_label(Decimal::from_str("7.5").unwrap(), "GBP"),
            "7.50 GBP"
        );
    }

    #[test]
    fn test_show_view_labels() {
        let now = Utc::now();
        let show = Show {
            id: ShowId::new(1),
            date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            doors_time: NaiveTime::from_hms_opt(19, 30, 0),
            venue: "The Lexington".to_string(),
            city: "London".to_string(),
            region: None,
            country: "UK".to_string(),
            ticket_url: None,
            sold_out: true,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let view = ShowView::from(&show);
        assert_eq!(view.date_label, "Fri 20 Nov 2026");
        assert_eq!(view.iso_date, "2026-11-20");
        assert_eq!(view.doors_label.as_deref(), Some("Doors 7:30 PM"));
        assert_eq!(view.location, "London, UK");
        assert!(view.sold_out);
    }

    #[test]
    fn test_product_card_alt_falls_back_to_title() {
        let product = MerchProduct {
            id: "gid://shopify/Product/1".to_string(),
            title: "Tour Tee".to_string(),
            handle: "tour-tee".to_string(),
            description: String::new(),
            image_url: None,
            image_alt: None,
            price: Decimal::from(30),
            currency: "USD".to_string(),
            available: false,
            url: "https://owls.myshopify.com/products/tour-tee".to_string(),
        };

        let card = ProductCard::from(&product);
        assert_eq!(card.image_alt, "Tour Tee");
        assert_eq!(card.price_label, "30.00 USD");
        assert!(!card.available);
    }
}
