//! Amazon SES bounce and complaint notifications delivered over SNS.
//!
//! Permanent bounces and complaints add the address to the suppression list
//! for every tenant, so no site mails it again.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use bandsite_core::{Email, SubscriberStatus};

use crate::db::{RepositoryError, SubscriberRepository};

/// Errors from SNS notification handling.
#[derive(Debug, Error)]
pub enum SesWebhookError {
    /// The envelope or inner message is not valid JSON of the expected shape.
    #[error("Invalid notification: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// `SubscribeURL` is not an https amazonaws.com URL.
    #[error("Refusing to confirm subscription URL: {0}")]
    UntrustedSubscribeUrl(String),

    /// Confirming the subscription failed.
    #[error("Subscription confirmation failed: {0}")]
    Confirmation(#[from] reqwest::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// SNS HTTP(S) delivery envelope.
#[derive(Debug, Deserialize)]
#[serde(tag = "Type")]
pub enum SnsMessage {
    SubscriptionConfirmation {
        #[serde(rename = "TopicArn")]
        topic_arn: String,
        #[serde(rename = "SubscribeURL")]
        subscribe_url: String,
    },
    Notification {
        #[serde(rename = "Message")]
        message: String,
    },
    UnsubscribeConfirmation {
        #[serde(rename = "TopicArn")]
        topic_arn: String,
    },
}

/// The SES notification inside an SNS `Message`.
///
/// Both the notification format (`notificationType`) and the event
/// publishing format (`eventType`) are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesNotification {
    #[serde(alias = "eventType")]
    pub notification_type: String,
    pub bounce: Option<Bounce>,
    pub complaint: Option<Complaint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounce {
    pub bounce_type: String,
    #[serde(default)]
    pub bounced_recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(default)]
    pub complained_recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: String,
}

/// What handling a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    SubscriptionConfirmed,
    /// Addresses moved to the given status, and the number of rows changed.
    Suppressed {
        status: SubscriberStatus,
        recipients: usize,
        rows: u64,
    },
    Ignored,
}

/// Check the `?token=` query parameter against the configured secret.
///
/// Always false when no secret is configured.
#[must_use]
pub fn verify_token(expected: Option<&SecretString>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) => {
            constant_time_compare(expected.expose_secret(), provided)
        }
        _ => false,
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Whether a `SubscribeURL` may be fetched: https on an `amazonaws.com` host.
#[must_use]
pub fn is_trusted_subscribe_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    url.scheme() == "https"
        && url
            .host_str()
            .is_some_and(|host| host.ends_with(".amazonaws.com"))
}

/// Recipients to suppress for a notification, with their new status.
///
/// Transient bounces and other notification types yield `None`.
#[must_use]
pub fn suppression(notification: &SesNotification) -> Option<(SubscriberStatus, Vec<&str>)> {
    match notification.notification_type.as_str() {
        "Bounce" => {
            let bounce = notification.bounce.as_ref()?;
            (bounce.bounce_type == "Permanent").then(|| {
                (
                    SubscriberStatus::Bounced,
                    bounce
                        .bounced_recipients
                        .iter()
                        .map(|r| r.email_address.as_str())
                        .collect(),
                )
            })
        }
        "Complaint" => {
            let complaint = notification.complaint.as_ref()?;
            Some((
                SubscriberStatus::Complained,
                complaint
                    .complained_recipients
                    .iter()
                    .map(|r| r.email_address.as_str())
                    .collect(),
            ))
        }
        _ => None,
    }
}

/// Handle one SNS delivery (body already authenticated by token).
///
/// # Errors
///
/// Returns `SesWebhookError::InvalidPayload` for malformed JSON and
/// `SesWebhookError::UntrustedSubscribeUrl` for a suspicious confirmation.
#[instrument(skip_all)]
pub async fn handle(
    pool: &PgPool,
    http: &reqwest::Client,
    body: &str,
) -> Result<WebhookOutcome, SesWebhookError> {
    match serde_json::from_str::<SnsMessage>(body)? {
        SnsMessage::SubscriptionConfirmation {
            topic_arn,
            subscribe_url,
        } => {
            if !is_trusted_subscribe_url(&subscribe_url) {
                tracing::warn!(url = %subscribe_url, "Untrusted SNS SubscribeURL");
                return Err(SesWebhookError::UntrustedSubscribeUrl(subscribe_url));
            }
            http.get(&subscribe_url).send().await?.error_for_status()?;
            tracing::info!(topic_arn = %topic_arn, "SNS subscription confirmed");
            Ok(WebhookOutcome::SubscriptionConfirmed)
        }
        SnsMessage::Notification { message } => {
            let notification: SesNotification = serde_json::from_str(&message)?;
            let Some((status, recipients)) = suppression(&notification) else {
                tracing::debug!(
                    notification_type = %notification.notification_type,
                    "Ignoring SES notification"
                );
                return Ok(WebhookOutcome::Ignored);
            };

            let repo = SubscriberRepository::new(pool);
            let mut rows = 0;
            for raw in &recipients {
                match Email::normalized(raw) {
                    Ok(address) => rows += repo.suppress_email(&address, status).await?,
                    Err(e) => {
                        tracing::warn!(address = %raw, error = %e, "Skipping invalid recipient");
                    }
                }
            }

            tracing::info!(
                status = %status,
                recipients = recipients.len(),
                rows,
                "Suppressed newsletter addresses"
            );
            Ok(WebhookOutcome::Suppressed {
                status,
                recipients: recipients.len(),
                rows,
            })
        }
        SnsMessage::UnsubscribeConfirmation { topic_arn } => {
            tracing::warn!(topic_arn = %topic_arn, "SNS subscription removed");
            Ok(WebhookOutcome::Ignored)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn notification(json: serde_json::Value) -> SesNotification {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_verify_token() {
        let secret = SecretString::from("s3cr3t-T0ken-value");
        assert!(verify_token(Some(&secret), Some("s3cr3t-T0ken-value")));
        assert!(!verify_token(Some(&secret), Some("s3cr3t-T0ken-valuf")));
        assert!(!verify_token(Some(&secret), None));
        assert!(!verify_token(None, Some("anything")));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "world"));
    }

    #[test]
    fn test_subscribe_url_must_be_aws_https() {
        assert!(is_trusted_subscribe_url(
            "https://sns.us-east-1.amazonaws.com/?Action=ConfirmSubscription&Token=abc"
        ));
        assert!(!is_trusted_subscribe_url(
            "http://sns.us-east-1.amazonaws.com/?Action=ConfirmSubscription"
        ));
        assert!(!is_trusted_subscribe_url("https://amazonaws.com.evil.example/"));
        assert!(!is_trusted_subscribe_url("https://evil-amazonaws.com/"));
        assert!(!is_trusted_subscribe_url("not a url"));
    }

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{"Type":"Notification","MessageId":"1","TopicArn":"arn:aws:sns:x","Message":"{}"}"#;
        assert!(matches!(
            serde_json::from_str::<SnsMessage>(body).unwrap(),
            SnsMessage::Notification { .. }
        ));

        let body = r#"{"Type":"SubscriptionConfirmation","TopicArn":"arn:aws:sns:x","SubscribeURL":"https://sns.us-east-1.amazonaws.com/"}"#;
        assert!(matches!(
            serde_json::from_str::<SnsMessage>(body).unwrap(),
            SnsMessage::SubscriptionConfirmation { .. }
        ));
    }

    #[test]
    fn test_permanent_bounce_suppresses() {
        let n = notification(serde_json::json!({
            "notificationType": "Bounce",
            "bounce": {
                "bounceType": "Permanent",
                "bouncedRecipients": [{"emailAddress": "gone@example.com"}]
            }
        }));
        let (status, recipients) = suppression(&n).unwrap();
        assert_eq!(status, SubscriberStatus::Bounced);
        assert_eq!(recipients, vec!["gone@example.com"]);
    }

    #[test]
    fn test_transient_bounce_ignored() {
        let n = notification(serde_json::json!({
            "notificationType": "Bounce",
            "bounce": {
                "bounceType": "Transient",
                "bouncedRecipients": [{"emailAddress": "full@example.com"}]
            }
        }));
        assert!(suppression(&n).is_none());
    }

    #[test]
    fn test_complaint_event_format() {
        let n = notification(serde_json::json!({
            "eventType": "Complaint",
            "complaint": {"complainedRecipients": [{"emailAddress": "angry@example.com"}]}
        }));
        let (status, recipients) = suppression(&n).unwrap();
        assert_eq!(status, SubscriberStatus::Complained);
        assert_eq!(recipients, vec!["angry@example.com"]);
    }

    #[test]
    fn test_delivery_ignored() {
        let n = notification(serde_json::json!({"notificationType": "Delivery"}));
        assert!(suppression(&n).is_none());
    }
}
