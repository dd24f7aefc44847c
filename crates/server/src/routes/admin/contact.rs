//! Admin contact info editing.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::ContactRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{ContactInfo, ContactInput};
use crate::services::contact;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<ContactInfo>, AppError> {
    Ok(Json(ContactRepository::new(state.pool()).get(tenant.id()).await?))
}

/// Replace contact info. Omitted or empty fields are cleared.
#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ContactInput>,
) -> Result<Json<ContactInfo>, AppError> {
    let contact = contact::validate(input)?;
    let saved = ContactRepository::new(state.pool())
        .upsert(auth.tenant.id(), &contact)
        .await?;

    tracing::info!(admin_id = %auth.admin.id, "Contact info updated");
    Ok(Json(saved))
}
