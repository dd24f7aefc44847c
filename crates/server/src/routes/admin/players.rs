//! Admin Spotify player management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bandsite_core::PlayerId;

use super::{MAX_TITLE_LENGTH, embed_error, reorder_error};
use crate::db::PlayerRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{PlayerInput, ReorderInput, SpotifyPlayer};
use crate::services::embeds::{SpotifyEmbed, parse_spotify_url};
use crate::services::validation::optional_text;
use crate::state::AppState;

/// Parse and validate a player form.
fn validate(input: PlayerInput) -> Result<(String, SpotifyEmbed, Option<String>), AppError> {
    let url = input.spotify_url.trim().to_string();
    let embed = parse_spotify_url(&url).map_err(|e| embed_error("spotify_url", &e))?;
    let title = optional_text("title", input.title, MAX_TITLE_LENGTH)?;
    Ok((url, embed, title))
}

pub async fn list(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<Vec<SpotifyPlayer>>, AppError> {
    Ok(Json(PlayerRepository::new(state.pool()).list(tenant.id()).await?))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<PlayerInput>,
) -> Result<(StatusCode, Json<SpotifyPlayer>), AppError> {
    let compact = input.compact;
    let (url, embed, title) = validate(input)?;
    let player = PlayerRepository::new(state.pool())
        .create(auth.tenant.id(), &url, &embed, title.as_deref(), compact)
        .await?;

    tracing::info!(player_id = %player.id, kind = %embed.kind.as_str(), "Spotify player added");
    Ok((StatusCode::CREATED, Json(player)))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), player_id = id))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
    Json(input): Json<PlayerInput>,
) -> Result<Json<SpotifyPlayer>, AppError> {
    let compact = input.compact;
    let (url, embed, title) = validate(input)?;
    let player = PlayerRepository::new(state.pool())
        .update(
            auth.tenant.id(),
            PlayerId::new(id),
            &url,
            &embed,
            title.as_deref(),
            compact,
        )
        .await?;
    Ok(Json(player))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), player_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    PlayerRepository::new(state.pool())
        .delete(auth.tenant.id(), PlayerId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set display order. `ids` must list every player exactly once.
#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn reorder(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ReorderInput>,
) -> Result<Json<Vec<SpotifyPlayer>>, AppError> {
    let repo = PlayerRepository::new(state.pool());
    repo.reorder(auth.tenant.id(), &input.ids)
        .await
        .map_err(reorder_error)?;
    Ok(Json(repo.list(auth.tenant.id()).await?))
}
