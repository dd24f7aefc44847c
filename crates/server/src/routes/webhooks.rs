//! Inbound webhooks.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::services::ses::{self, WebhookOutcome};
use crate::state::AppState;

/// Query string of the SNS subscription endpoint.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub token: Option<String>,
}

/// Amazon SNS deliveries for SES bounce and complaint notifications.
///
/// SNS posts with `Content-Type: text/plain`, so the body is taken as a string.
#[instrument(skip_all)]
pub async fn ses(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> Result<Json<Value>, AppError> {
    if !ses::verify_token(
        state.config().ses_webhook_token.as_ref(),
        query.token.as_deref(),
    ) {
        tracing::warn!("Rejected SES webhook with bad token");
        return Err(AppError::Forbidden("Invalid webhook token".to_string()));
    }

    let outcome = ses::handle(state.pool(), state.http(), &body).await?;
    let status = match outcome {
        WebhookOutcome::SubscriptionConfirmed => "subscription_confirmed",
        WebhookOutcome::Suppressed { .. } => "processed",
        WebhookOutcome::Ignored => "ignored",
    };

    Ok(Json(json!({ "status": status })))
}
