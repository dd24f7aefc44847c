//! Newsletter subscriber repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bandsite_core::{Email, SubscriberId, SubscriberStatus, TenantId};

use super::RepositoryError;
use crate::models::Subscriber;

#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: i32,
    tenant_id: i32,
    email: String,
    name: Option<String>,
    status: SubscriberStatus,
    unsubscribe_token: Uuid,
    source: Option<String>,
    subscribed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: SubscriberId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            email,
            name: row.name,
            status: row.status,
            unsubscribe_token: row.unsubscribe_token,
            source: row.source,
            subscribed_at: row.subscribed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SUBSCRIBER_COLUMNS: &str = "id, tenant_id, email, name, status, unsubscribe_token, source, \
                                  subscribed_at, created_at, updated_at";

/// Repository for newsletter subscribers.
pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a tenant's subscriber by (normalised) email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(
        &self,
        tenant_id: TenantId,
        email: &Email,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let row: Option<SubscriberRow> = sqlx::query_as(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM bandsite.newsletter_subscriber \
             WHERE tenant_id = $1 AND email = $2"
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new `subscribed` row with a fresh unsubscribe token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already on the tenant's list.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        email: &Email,
        name: Option<&str>,
        source: Option<&str>,
    ) -> Result<Subscriber, RepositoryError> {
        let row: SubscriberRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.newsletter_subscriber \
                (tenant_id, email, name, status, unsubscribe_token, source) \
             VALUES ($1, $2, $3, 'subscribed', $4, $5) \
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(email)
        .bind(name)
        .bind(Uuid::new_v4())
        .bind(source)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already subscribed"))?;

        row.try_into()
    }

    /// Move an `unsubscribed` row back to `subscribed`.
    ///
    /// Returns `None` when the row was not `unsubscribed` (nothing changed).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resubscribe(
        &self,
        tenant_id: TenantId,
        id: SubscriberId,
        name: Option<&str>,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let row: Option<SubscriberRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.newsletter_subscriber \
             SET status = 'subscribed', name = COALESCE($3, name), \
                 subscribed_at = NOW(), updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND status = 'unsubscribed' \
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Unsubscribe by token. Suppressed rows keep their status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no subscriber has this token.
    pub async fn unsubscribe_by_token(&self, token: Uuid) -> Result<Subscriber, RepositoryError> {
        let row: Option<SubscriberRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.newsletter_subscriber \
             SET status = CASE WHEN status = 'subscribed' THEN 'unsubscribed'::bandsite.subscriber_status \
                               ELSE status END, \
                 updated_at = NOW() \
             WHERE unsubscribe_token = $1 \
             RETURNING {SUBSCRIBER_COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// One page of a tenant's subscribers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        status: Option<SubscriberStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscriber>, RepositoryError> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM bandsite.newsletter_subscriber \
             WHERE tenant_id = $1 AND ($2::bandsite.subscriber_status IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(tenant_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count a tenant's subscribers, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(
        &self,
        tenant_id: TenantId,
        status: Option<SubscriberStatus>,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bandsite.newsletter_subscriber \
             WHERE tenant_id = $1 AND ($2::bandsite.subscriber_status IS NULL OR status = $2)",
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Every `subscribed` row of a tenant, oldest first, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_subscribed(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<Subscriber>, RepositoryError> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM bandsite.newsletter_subscriber \
             WHERE tenant_id = $1 AND status = 'subscribed' \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Delete a tenant's subscriber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subscriber is not the tenant's.
    pub async fn delete(
        &self,
        tenant_id: TenantId,
        id: SubscriberId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM bandsite.newsletter_subscriber WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Put an address on the suppression list for every tenant.
    ///
    /// Used by SES bounce/complaint notifications, which identify recipients
    /// by address only. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn suppress_email(
        &self,
        email: &Email,
        status: SubscriberStatus,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bandsite.newsletter_subscriber \
             SET status = $2, updated_at = NOW() \
             WHERE email = $1 AND status <> $2",
        )
        .bind(email)
        .bind(status)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
