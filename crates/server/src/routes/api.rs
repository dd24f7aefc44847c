//! Public JSON API for the tenant resolved from the host.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::{ContactRepository, PlayerRepository, VideoRepository};
use crate::error::AppError;
use crate::middleware::RequireTenant;
use crate::models::{ContactInfo, MerchStorefront, PublicShows, SpotifyPlayer, Theme, Video};
use crate::services::{merch, shows, theme};
use crate::state::AppState;
use crate::tenancy::site_url;

/// `GET /api/site` response.
#[derive(Debug, Serialize)]
pub struct SiteInfo {
    pub slug: String,
    pub name: String,
    pub url: String,
}

/// Basic site identity.
pub async fn site(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Json<SiteInfo> {
    Json(SiteInfo {
        slug: tenant.slug.to_string(),
        name: tenant.name.clone(),
        url: site_url(
            &tenant,
            &state.config().platform_domain,
            state.config().is_secure(),
        ),
    })
}

/// The site theme (defaults when never customised).
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn theme(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<Theme>, AppError> {
    Ok(Json(theme::load(state.pool(), tenant.id()).await?))
}

/// Upcoming and past shows, or the Bandsintown widget descriptor.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn shows(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<PublicShows>, AppError> {
    let listing = shows::public_listing(state.pool(), tenant.id(), shows::today()).await?;
    Ok(Json(listing))
}

/// Spotify players in display order.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn players(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<Vec<SpotifyPlayer>>, AppError> {
    Ok(Json(PlayerRepository::new(state.pool()).list(tenant.id()).await?))
}

/// YouTube videos in display order.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn videos(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<Vec<Video>>, AppError> {
    Ok(Json(VideoRepository::new(state.pool()).list(tenant.id()).await?))
}

/// Contact emails and social links.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn contact(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<ContactInfo>, AppError> {
    Ok(Json(ContactRepository::new(state.pool()).get(tenant.id()).await?))
}

/// The merch storefront. A Storefront API failure is a 502 here.
#[instrument(skip(state, tenant), fields(tenant_id = %tenant.id()))]
pub async fn merch(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> Result<Json<MerchStorefront>, AppError> {
    let storefront = merch::storefront(state.pool(), state.storefront(), tenant.id()).await?;
    Ok(Json(storefront))
}
