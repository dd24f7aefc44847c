//! Newsletter subscriber types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bandsite_core::{Email, SubscriberId, SubscriberStatus, TenantId};

/// A newsletter subscriber of one tenant.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    #[serde(skip)]
    pub tenant_id: TenantId,
    pub email: Email,
    pub name: Option<String>,
    pub status: SubscriberStatus,
    #[serde(skip)]
    pub unsubscribe_token: Uuid,
    pub source: Option<String>,
    /// When the current subscription started. Differs from `created_at`
    /// after an unsubscribe and a later signup.
    pub subscribed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public signup form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Honeypot field. Real visitors never fill it in.
    #[serde(default)]
    pub website: Option<String>,
}

/// One page of the admin subscriber list.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberPage {
    pub subscribers: Vec<Subscriber>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}
