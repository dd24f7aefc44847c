//! Contact info repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::TenantId;

use super::RepositoryError;
use crate::models::ContactInfo;

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    booking_email: Option<String>,
    management_email: Option<String>,
    press_email: Option<String>,
    phone: Option<String>,
    instagram_url: Option<String>,
    facebook_url: Option<String>,
    twitter_url: Option<String>,
    tiktok_url: Option<String>,
    youtube_url: Option<String>,
    spotify_url: Option<String>,
    apple_music_url: Option<String>,
    bandcamp_url: Option<String>,
    soundcloud_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactInfo {
    fn from(row: ContactRow) -> Self {
        Self {
            booking_email: row.booking_email,
            management_email: row.management_email,
            press_email: row.press_email,
            phone: row.phone,
            instagram_url: row.instagram_url,
            facebook_url: row.facebook_url,
            twitter_url: row.twitter_url,
            tiktok_url: row.tiktok_url,
            youtube_url: row.youtube_url,
            spotify_url: row.spotify_url,
            apple_music_url: row.apple_music_url,
            bandcamp_url: row.bandcamp_url,
            soundcloud_url: row.soundcloud_url,
            updated_at: Some(row.updated_at),
        }
    }
}

const CONTACT_COLUMNS: &str = "booking_email, management_email, press_email, phone, \
    instagram_url, facebook_url, twitter_url, tiktok_url, youtube_url, spotify_url, \
    apple_music_url, bandcamp_url, soundcloud_url, updated_at";

/// Repository for tenant contact info.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tenant's contact info; empty when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, tenant_id: TenantId) -> Result<ContactInfo, RepositoryError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM bandsite.contact_info WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into).unwrap_or_default())
    }

    /// Insert or replace a tenant's contact info.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        tenant_id: TenantId,
        contact: &ContactInfo,
    ) -> Result<ContactInfo, RepositoryError> {
        let row: ContactRow = sqlx::query_as(&format!(
            r"
            INSERT INTO bandsite.contact_info (
                tenant_id, booking_email, management_email, press_email, phone,
                instagram_url, facebook_url, twitter_url, tiktok_url, youtube_url,
                spotify_url, apple_music_url, bandcamp_url, soundcloud_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (tenant_id) DO UPDATE SET
                booking_email = EXCLUDED.booking_email,
                management_email = EXCLUDED.management_email,
                press_email = EXCLUDED.press_email,
                phone = EXCLUDED.phone,
                instagram_url = EXCLUDED.instagram_url,
                facebook_url = EXCLUDED.facebook_url,
                twitter_url = EXCLUDED.twitter_url,
                tiktok_url = EXCLUDED.tiktok_url,
                youtube_url = EXCLUDED.youtube_url,
                spotify_url = EXCLUDED.spotify_url,
                apple_music_url = EXCLUDED.apple_music_url,
                bandcamp_url = EXCLUDED.bandcamp_url,
                soundcloud_url = EXCLUDED.soundcloud_url,
                updated_at = NOW()
            RETURNING {CONTACT_COLUMNS}
            "
        ))
        .bind(tenant_id)
        .bind(&contact.booking_email)
        .bind(&contact.management_email)
        .bind(&contact.press_email)
        .bind(&contact.phone)
        .bind(&contact.instagram_url)
        .bind(&contact.facebook_url)
        .bind(&contact.twitter_url)
        .bind(&contact.tiktok_url)
        .bind(&contact.youtube_url)
        .bind(&contact.spotify_url)
        .bind(&contact.apple_music_url)
        .bind(&contact.bandcamp_url)
        .bind(&contact.soundcloud_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
