//! Admin show management and show source settings.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bandsite_core::ShowId;

use crate::db::ShowRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{Show, ShowInput, ShowSettings, ShowSettingsInput};
use crate::services::shows;
use crate::state::AppState;

/// Every show, oldest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<Vec<Show>>, AppError> {
    Ok(Json(ShowRepository::new(state.pool()).list_all(tenant.id()).await?))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ShowInput>,
) -> Result<(StatusCode, Json<Show>), AppError> {
    let input = shows::validate(input)?;
    let show = ShowRepository::new(state.pool())
        .create(auth.tenant.id(), &input)
        .await?;

    tracing::info!(show_id = %show.id, date = %show.date, "Show created");
    Ok((StatusCode::CREATED, Json(show)))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), show_id = id))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
    Json(input): Json<ShowInput>,
) -> Result<Json<Show>, AppError> {
    let input = shows::validate(input)?;
    let show = ShowRepository::new(state.pool())
        .update(auth.tenant.id(), ShowId::new(id), &input)
        .await?;
    Ok(Json(show))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), show_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ShowRepository::new(state.pool())
        .delete(auth.tenant.id(), ShowId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Where public shows come from: manual entries or Bandsintown.
pub async fn get_settings(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<ShowSettings>, AppError> {
    Ok(Json(
        ShowRepository::new(state.pool())
            .get_settings(tenant.id())
            .await?,
    ))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn update_settings(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ShowSettingsInput>,
) -> Result<Json<ShowSettings>, AppError> {
    let settings = shows::validate_settings(input)?;
    ShowRepository::new(state.pool())
        .upsert_settings(auth.tenant.id(), &settings)
        .await?;

    tracing::info!(source = ?settings.source, "Show settings updated");
    Ok(Json(settings))
}
