//! Admin theme editing.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::ThemeRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{Theme, ThemeInput};
use crate::services::theme;
use crate::state::AppState;

/// Current theme (defaults when never saved).
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<Theme>, AppError> {
    Ok(Json(theme::load(state.pool(), tenant.id()).await?))
}

/// Validate and save the theme.
#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ThemeInput>,
) -> Result<Json<Theme>, AppError> {
    let theme = theme::validate(input)?;
    let saved = ThemeRepository::new(state.pool())
        .upsert(auth.tenant.id(), &theme)
        .await?;

    tracing::info!(admin_id = %auth.admin.id, "Theme updated");
    Ok(Json(saved))
}
