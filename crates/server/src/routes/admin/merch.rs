//! Admin merch storefront configuration. Owner only.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::{MerchConfigInput, MerchConfigView};
use crate::services::merch;
use crate::state::AppState;

/// Current configuration. Secrets are reported as set or unset, never echoed.
pub async fn get(
    State(state): State<AppState>,
    RequireOwner(auth): RequireOwner,
) -> Result<Json<MerchConfigView>, AppError> {
    Ok(Json(merch::get(state.pool(), auth.tenant.id()).await?))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn update(
    State(state): State<AppState>,
    RequireOwner(auth): RequireOwner,
    Json(input): Json<MerchConfigInput>,
) -> Result<Json<MerchConfigView>, AppError> {
    let view = merch::update(state.pool(), state.storefront(), auth.tenant.id(), input).await?;
    Ok(Json(view))
}
