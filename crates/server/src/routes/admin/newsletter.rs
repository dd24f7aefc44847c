//! Admin subscriber list, deletion and CSV export.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use bandsite_core::SubscriberId;

use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireOwner};
use crate::models::SubscriberPage;
use crate::services::newsletter::{self, ListQuery};
use crate::state::AppState;

/// Paged subscriber list, newest first, optionally filtered by status.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<SubscriberPage>, AppError> {
    Ok(Json(newsletter::list(state.pool(), tenant.id(), &query).await?))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), subscriber_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireOwner(auth): RequireOwner,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    newsletter::delete(state.pool(), auth.tenant.id(), SubscriberId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download current subscribers as CSV.
#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn export(
    State(state): State<AppState>,
    RequireOwner(auth): RequireOwner,
) -> Result<Response, AppError> {
    let csv = newsletter::export_csv(state.pool(), auth.tenant.id()).await?;
    let disposition = attachment_header(auth.tenant.slug.as_str(), Utc::now().date_naive());

    tracing::info!(bytes = csv.len(), "Subscriber export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        csv,
    )
        .into_response())
}

fn attachment_header(slug: &str, date: NaiveDate) -> String {
    format!("attachment; filename=\"{slug}-subscribers-{date}.csv\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_header() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            attachment_header("midnight-owls", date),
            "attachment; filename=\"midnight-owls-subscribers-2026-03-07.csv\""
        );
    }
}
