//! Newsletter signups, unsubscribes and the admin subscriber list.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use bandsite_core::{Email, SubscriberId, SubscriberStatus, TenantId};

use super::email::{EmailService, NewsletterWelcome};
use super::validation::{ValidationError, optional_text};
use crate::db::{RepositoryError, SubscriberRepository};
use crate::models::{SignupInput, Subscriber, SubscriberPage, Tenant};

/// Default page size for the admin list.
pub const DEFAULT_PER_PAGE: u32 = 50;
/// Largest page size for the admin list.
pub const MAX_PER_PAGE: u32 = 200;

const MAX_NAME_LENGTH: usize = 100;
const MAX_SOURCE_LENGTH: usize = 50;

/// Errors from newsletter operations.
#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// What a signup did. Every variant is reported to the visitor as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupOutcome {
    /// New subscriber.
    Subscribed,
    /// Previously unsubscribed, now subscribed again.
    Resubscribed,
    /// Already on the list; nothing changed.
    AlreadySubscribed,
    /// Address bounced or complained; nothing changed.
    Suppressed,
    /// Honeypot field filled in; nothing stored.
    Ignored,
}

/// What a signup does to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignupPlan {
    /// Insert a subscribed row and send the welcome email.
    Create,
    /// Set an unsubscribed row back to subscribed and send the welcome email.
    Resubscribe,
    /// Leave the row alone and send nothing.
    Keep(SignupOutcome),
}

/// What a signup does, given the address's current status. Bounced and complained
/// addresses are a suppression list: a new signup never revives them.
const fn plan_signup(existing: Option<SubscriberStatus>) -> SignupPlan {
    match existing {
        None => SignupPlan::Create,
        Some(SubscriberStatus::Unsubscribed) => SignupPlan::Resubscribe,
        Some(SubscriberStatus::Subscribed) => SignupPlan::Keep(SignupOutcome::AlreadySubscribed),
        Some(SubscriberStatus::Bounced | SubscriberStatus::Complained) => {
            SignupPlan::Keep(SignupOutcome::Suppressed)
        }
    }
}

/// Whether the hidden `website` field was filled in.
fn is_bot(input: &SignupInput) -> bool {
    input.website.as_deref().is_some_and(|w| !w.trim().is_empty())
}

/// Query parameters for the admin subscriber list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<SubscriberStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A visitor's signup, with the tenant context needed for the welcome email.
pub struct Signup<'a> {
    pub tenant: &'a Tenant,
    /// Public URL of the tenant's site, without trailing slash.
    pub site_url: &'a str,
    pub input: SignupInput,
}

/// Add a visitor to a tenant's list.
///
/// New and returning subscribers get a welcome email in the background; a
/// delivery failure is logged and does not affect the outcome.
///
/// # Errors
///
/// Returns `NewsletterError::Validation` for an invalid email address.
#[instrument(skip(pool, email, signup), fields(tenant_id = %signup.tenant.id))]
pub async fn signup(
    pool: &PgPool,
    email: &EmailService,
    signup: Signup<'_>,
) -> Result<SignupOutcome, NewsletterError> {
    let Signup {
        tenant,
        site_url,
        input,
    } = signup;

    if is_bot(&input) {
        tracing::info!("Newsletter honeypot triggered, ignoring signup");
        return Ok(SignupOutcome::Ignored);
    }

    let address = Email::normalized(&input.email)
        .map_err(|e| ValidationError::new("email", e.to_string()))?;
    let name = optional_text("name", input.name, MAX_NAME_LENGTH)?;
    let source = optional_text("source", input.source, MAX_SOURCE_LENGTH)?;

    let repo = SubscriberRepository::new(pool);
    let existing = repo.get_by_email(tenant.id, &address).await?;
    let plan = plan_signup(existing.as_ref().map(|s| s.status));
    let (outcome, subscriber) = match (plan, existing) {
        (SignupPlan::Keep(outcome), _) => (outcome, None),
        (SignupPlan::Resubscribe, Some(existing)) => {
            match repo
                .resubscribe(tenant.id, existing.id, name.as_deref())
                .await?
            {
                Some(subscriber) => (SignupOutcome::Resubscribed, Some(subscriber)),
                None => (SignupOutcome::AlreadySubscribed, None),
            }
        }
        _ => match repo
            .create(tenant.id, &address, name.as_deref(), source.as_deref())
            .await
        {
            Ok(subscriber) => (SignupOutcome::Subscribed, Some(subscriber)),
            // Lost a race with a concurrent signup for the same address.
            Err(RepositoryError::Conflict(_)) => (SignupOutcome::AlreadySubscribed, None),
            Err(e) => return Err(e.into()),
        },
    };

    tracing::info!(outcome = ?outcome, "Newsletter signup");

    if let Some(subscriber) = subscriber {
        send_welcome(email.clone(), tenant, site_url, &subscriber);
    }

    Ok(outcome)
}

/// Link that unsubscribes `token`.
#[must_use]
pub fn unsubscribe_url(site_url: &str, token: Uuid) -> String {
    format!("{site_url}/newsletter/unsubscribe?token={token}")
}

fn send_welcome(email: EmailService, tenant: &Tenant, site_url: &str, subscriber: &Subscriber) {
    let to = subscriber.email.to_string();
    let name = subscriber.name.clone();
    let band_name = tenant.name.clone();
    let site_url = site_url.to_string();
    let unsubscribe = unsubscribe_url(&site_url, subscriber.unsubscribe_token);

    tokio::spawn(async move {
        let welcome = NewsletterWelcome {
            band_name: &band_name,
            name: name.as_deref(),
            site_url: &site_url,
            unsubscribe_url: &unsubscribe,
        };
        if let Err(e) = email.send_newsletter_welcome(&to, welcome).await {
            tracing::warn!(error = %e, to = %to, "Failed to send newsletter welcome email");
        }
    });
}

/// Unsubscribe by the token from an email link.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` for a malformed or unknown token.
#[instrument(skip(pool, token))]
pub async fn unsubscribe(pool: &PgPool, token: &str) -> Result<Subscriber, NewsletterError> {
    let token = Uuid::parse_str(token.trim()).map_err(|_| RepositoryError::NotFound)?;
    let subscriber = SubscriberRepository::new(pool)
        .unsubscribe_by_token(token)
        .await?;

    tracing::info!(
        tenant_id = %subscriber.tenant_id,
        subscriber_id = %subscriber.id,
        status = %subscriber.status,
        "Newsletter unsubscribe"
    );
    Ok(subscriber)
}

/// Resolve `page`/`per_page` to 1-based page, page size and row offset.
///
/// # Errors
///
/// Returns a `ValidationError` for a zero page or a page size outside 1-200.
pub fn paging(query: &ListQuery) -> Result<(u32, u32, i64), ValidationError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ValidationError::new("page", "must be at least 1"));
    }
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ValidationError::new(
            "per_page",
            format!("must be between 1 and {MAX_PER_PAGE}"),
        ));
    }
    let offset = i64::from(page - 1) * i64::from(per_page);
    Ok((page, per_page, offset))
}

/// One page of a tenant's subscribers, newest first.
///
/// # Errors
///
/// Returns `NewsletterError::Validation` for bad paging parameters.
pub async fn list(
    pool: &PgPool,
    tenant_id: TenantId,
    query: &ListQuery,
) -> Result<SubscriberPage, NewsletterError> {
    let (page, per_page, offset) = paging(query)?;
    let repo = SubscriberRepository::new(pool);

    let subscribers = repo
        .list(tenant_id, query.status, i64::from(per_page), offset)
        .await?;
    let total = repo.count(tenant_id, query.status).await?;

    Ok(SubscriberPage {
        subscribers,
        total,
        page,
        per_page,
    })
}

/// Delete a subscriber.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if it is not the tenant's.
pub async fn delete(
    pool: &PgPool,
    tenant_id: TenantId,
    id: SubscriberId,
) -> Result<(), NewsletterError> {
    SubscriberRepository::new(pool).delete(tenant_id, id).await?;
    tracing::info!(tenant_id = %tenant_id, subscriber_id = %id, "Subscriber deleted");
    Ok(())
}

/// CSV of the tenant's current subscribers.
///
/// # Errors
///
/// Returns `NewsletterError::Csv` if writing fails.
pub async fn export_csv(pool: &PgPool, tenant_id: TenantId) -> Result<Vec<u8>, NewsletterError> {
    let subscribers = SubscriberRepository::new(pool)
        .list_subscribed(tenant_id)
        .await?;
    write_csv(&subscribers)
}

fn write_csv(subscribers: &[Subscriber]) -> Result<Vec<u8>, NewsletterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["email", "name", "source", "subscribed_at"])?;

    for s in subscribers {
        writer.write_record([
            csv_cell(s.email.as_str()).as_str(),
            csv_cell(s.name.as_deref().unwrap_or_default()).as_str(),
            csv_cell(s.source.as_deref().unwrap_or_default()).as_str(),
            s.subscribed_at.to_rfc3339().as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| NewsletterError::Csv(e.into_error().into()))
}

/// Neutralise cells a spreadsheet would evaluate as a formula.
fn csv_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn subscriber(email: &str, name: Option<&str>) -> Subscriber {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Subscriber {
            id: SubscriberId::new(1),
            tenant_id: TenantId::new(1),
            email: Email::parse(email).unwrap(),
            name: name.map(String::from),
            status: SubscriberStatus::Subscribed,
            unsubscribe_token: Uuid::new_v4(),
            source: Some("homepage".to_string()),
            subscribed_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_paging_defaults_and_bounds() {
        assert_eq!(paging(&ListQuery::default()).unwrap(), (1, 50, 0));

        let query = ListQuery {
            page: Some(3),
            per_page: Some(200),
            ..ListQuery::default()
        };
        assert_eq!(paging(&query).unwrap(), (3, 200, 400));

        let query = ListQuery {
            per_page: Some(201),
            ..ListQuery::default()
        };
        assert_eq!(paging(&query).unwrap_err().field, "per_page");

        let query = ListQuery {
            page: Some(0),
            ..ListQuery::default()
        };
        assert_eq!(paging(&query).unwrap_err().field, "page");
    }

    #[test]
    fn test_csv_export_format() {
        let csv = write_csv(&[
            subscriber("fan@example.com", Some("Sam, Jr.")),
            subscriber("other@example.com", None),
        ])
        .unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "email,name,source,subscribed_at");
        assert_eq!(
            lines[1],
            "fan@example.com,\"Sam, Jr.\",homepage,2026-03-01T12:00:00+00:00"
        );
        assert_eq!(
            lines[2],
            "other@example.com,,homepage,2026-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_csv_export_uses_latest_subscription() {
        let mut returning = subscriber("back@example.com", None);
        returning.subscribed_at = Utc.with_ymd_and_hms(2026, 9, 1, 8, 30, 0).unwrap();

        let csv = String::from_utf8(write_csv(&[returning]).unwrap()).unwrap();
        assert_eq!(
            csv.lines().nth(1),
            Some("back@example.com,,homepage,2026-09-01T08:30:00+00:00")
        );
    }

    fn signup_input(website: Option<&str>) -> SignupInput {
        SignupInput {
            email: "fan@example.com".to_string(),
            name: None,
            source: None,
            website: website.map(String::from),
        }
    }

    #[test]
    fn test_honeypot_marks_bot() {
        assert!(is_bot(&signup_input(Some("http://spam.example"))));
        assert!(!is_bot(&signup_input(Some("   "))));
        assert!(!is_bot(&signup_input(None)));
    }

    #[test]
    fn test_new_address_is_created() {
        assert_eq!(plan_signup(None), SignupPlan::Create);
    }

    #[test]
    fn test_unsubscribed_address_is_resubscribed() {
        assert_eq!(
            plan_signup(Some(SubscriberStatus::Unsubscribed)),
            SignupPlan::Resubscribe
        );
    }

    #[test]
    fn test_second_signup_changes_nothing() {
        assert_eq!(
            plan_signup(Some(SubscriberStatus::Subscribed)),
            SignupPlan::Keep(SignupOutcome::AlreadySubscribed)
        );
    }

    #[test]
    fn test_suppressed_addresses_stay_suppressed() {
        for status in [SubscriberStatus::Bounced, SubscriberStatus::Complained] {
            assert_eq!(
                plan_signup(Some(status)),
                SignupPlan::Keep(SignupOutcome::Suppressed)
            );
        }
    }

    #[test]
    fn test_csv_cells_cannot_be_formulas() {
        assert_eq!(csv_cell("=HYPERLINK(\"x\")"), "'=HYPERLINK(\"x\")");
        assert_eq!(csv_cell("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(csv_cell("Sam"), "Sam");
    }

    #[test]
    fn test_unsubscribe_url() {
        let token = Uuid::nil();
        assert_eq!(
            unsubscribe_url("https://owls.bandsite.app", token),
            "https://owls.bandsite.app/newsletter/unsubscribe?token=00000000-0000-0000-0000-000000000000"
        );
    }
}
