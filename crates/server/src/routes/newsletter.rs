//! Public newsletter signup and unsubscribe.
//!
//! Signup accepts JSON from the site's scripts and a plain form post from the
//! homepage. Every accepted outcome (new, existing, suppressed, honeypot)
//! answers the same way, so the endpoint does not reveal list membership.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireTenant;
use crate::models::{CurrentTenant, SignupInput};
use crate::services::{NewsletterError, newsletter};
use crate::state::AppState;
use crate::tenancy::site_url;

const SIGNUP_MESSAGE: &str = "Thanks for signing up!";

/// Signup result page for form posts.
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribed.html")]
pub struct SubscribedTemplate {
    pub band_name: String,
    pub error: Option<String>,
}

/// Unsubscribe confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/unsubscribed.html")]
pub struct UnsubscribedTemplate {
    pub band_name: String,
    pub email: Option<String>,
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Subscribe to the tenant's mailing list.
#[instrument(skip(state, tenant, request), fields(tenant_id = %tenant.id()))]
pub async fn signup(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    request: Request,
) -> Result<Response, AppError> {
    if is_form(request.headers()) {
        let Form(input) = Form::<SignupInput>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let band_name = tenant.name.clone();
        return Ok(match run_signup(&state, &tenant, input).await {
            Ok(()) => SubscribedTemplate {
                band_name,
                error: None,
            }
            .into_response(),
            Err(NewsletterError::Validation(e)) => (
                StatusCode::BAD_REQUEST,
                SubscribedTemplate {
                    band_name,
                    error: Some(format!("Please check your {}: {}", e.field, e.message)),
                },
            )
                .into_response(),
            Err(e) => return Err(e.into()),
        });
    }

    let Json(input) = Json::<SignupInput>::from_request(request, &state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    run_signup(&state, &tenant, input).await?;

    Ok(Json(json!({"success": true, "message": SIGNUP_MESSAGE})).into_response())
}

async fn run_signup(
    state: &AppState,
    tenant: &CurrentTenant,
    input: SignupInput,
) -> Result<(), NewsletterError> {
    let site = site_url(
        tenant,
        &state.config().platform_domain,
        state.config().is_secure(),
    );
    newsletter::signup(
        state.pool(),
        state.email(),
        newsletter::Signup {
            tenant: tenant.0.as_ref(),
            site_url: &site,
            input,
        },
    )
    .await?;
    Ok(())
}

/// Query for the unsubscribe link.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    #[serde(default)]
    pub token: String,
}

/// Unsubscribe via the link in every newsletter email.
#[instrument(skip(state, tenant, query), fields(tenant_id = %tenant.id()))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    Query(query): Query<UnsubscribeQuery>,
) -> Result<Response, AppError> {
    let band_name = tenant.name.clone();

    match newsletter::unsubscribe(state.pool(), &query.token).await {
        Ok(subscriber) => Ok(UnsubscribedTemplate {
            band_name,
            email: Some(subscriber.email.into_inner()),
        }
        .into_response()),
        Err(NewsletterError::Repository(crate::db::RepositoryError::NotFound)) => Ok((
            StatusCode::NOT_FOUND,
            UnsubscribedTemplate {
                band_name,
                email: None,
            },
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_form() {
        let mut headers = HeaderMap::new();
        assert!(!is_form(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_form(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        assert!(is_form(&headers));
    }

    #[test]
    fn test_unsubscribed_page_renders() {
        let html = UnsubscribedTemplate {
            band_name: "Midnight Owls".to_string(),
            email: Some("fan@example.com".to_string()),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("fan@example.com"));
        assert!(html.contains("Midnight Owls"));

        let html = UnsubscribedTemplate {
            band_name: "Midnight Owls".to_string(),
            email: None,
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Link not recognised"));
    }
}
