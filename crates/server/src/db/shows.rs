//! Show and show-settings repository.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

use bandsite_core::{ShowId, ShowSource, TenantId};

use super::RepositoryError;
use crate::models::{Show, ShowInput, ShowSettings};

#[derive(Debug, sqlx::FromRow)]
struct ShowRow {
    id: i32,
    date: NaiveDate,
    doors_time: Option<NaiveTime>,
    venue: String,
    city: String,
    region: Option<String>,
    country: String,
    ticket_url: Option<String>,
    sold_out: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShowRow> for Show {
    fn from(row: ShowRow) -> Self {
        Self {
            id: ShowId::new(row.id),
            date: row.date,
            doors_time: row.doors_time,
            venue: row.venue,
            city: row.city,
            region: row.region,
            country: row.country,
            ticket_url: row.ticket_url,
            sold_out: row.sold_out,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShowSettingsRow {
    source: ShowSource,
    bandsintown_artist: Option<String>,
}

const SHOW_COLUMNS: &str = "id, date, doors_time, venue, city, region, country, ticket_url, \
                            sold_out, notes, created_at, updated_at";

/// Repository for a tenant's shows.
pub struct ShowRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShowRepository<'a> {
    /// Create a new show repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every show of a tenant, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, tenant_id: TenantId) -> Result<Vec<Show>, RepositoryError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM bandsite.show WHERE tenant_id = $1 ORDER BY date ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Shows on or after `today`, ascending by date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_upcoming(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
    ) -> Result<Vec<Show>, RepositoryError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM bandsite.show \
             WHERE tenant_id = $1 AND date >= $2 ORDER BY date ASC, id ASC"
        ))
        .bind(tenant_id)
        .bind(today)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Shows before `today`, most recent first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_past(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Show>, RepositoryError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM bandsite.show \
             WHERE tenant_id = $1 AND date < $2 ORDER BY date DESC, id DESC LIMIT $3"
        ))
        .bind(tenant_id)
        .bind(today)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a show.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        input: &ShowInput,
    ) -> Result<Show, RepositoryError> {
        let row: ShowRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.show \
                (tenant_id, date, doors_time, venue, city, region, country, ticket_url, sold_out, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {SHOW_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(input.date)
        .bind(input.doors_time)
        .bind(&input.venue)
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.country)
        .bind(&input.ticket_url)
        .bind(input.sold_out)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a show owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the show is not the tenant's.
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: ShowId,
        input: &ShowInput,
    ) -> Result<Show, RepositoryError> {
        let row: Option<ShowRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.show SET \
                date = $3, doors_time = $4, venue = $5, city = $6, region = $7, country = $8, \
                ticket_url = $9, sold_out = $10, notes = $11, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {SHOW_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(input.date)
        .bind(input.doors_time)
        .bind(&input.venue)
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.country)
        .bind(&input.ticket_url)
        .bind(input.sold_out)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a show owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the show is not the tenant's.
    pub async fn delete(&self, tenant_id: TenantId, id: ShowId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bandsite.show WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Get a tenant's show settings, defaulting to manual listings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_settings(&self, tenant_id: TenantId) -> Result<ShowSettings, RepositoryError> {
        let row: Option<ShowSettingsRow> = sqlx::query_as(
            "SELECT source, bandsintown_artist FROM bandsite.show_settings WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map_or_else(ShowSettings::default, |r| ShowSettings {
            source: r.source,
            bandsintown_artist: r.bandsintown_artist,
        }))
    }

    /// Insert or replace a tenant's show settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_settings(
        &self,
        tenant_id: TenantId,
        settings: &ShowSettings,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO bandsite.show_settings (tenant_id, source, bandsintown_artist)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id) DO UPDATE SET
                source = EXCLUDED.source,
                bandsintown_artist = EXCLUDED.bandsintown_artist
            ",
        )
        .bind(tenant_id)
        .bind(settings.source)
        .bind(&settings.bandsintown_artist)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
