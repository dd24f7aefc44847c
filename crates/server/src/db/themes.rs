//! Theme repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::{HexColor, LoadingAnimation, TenantId};

use super::RepositoryError;
use crate::models::Theme;

#[derive(Debug, sqlx::FromRow)]
struct ThemeRow {
    primary_color: HexColor,
    secondary_color: HexColor,
    background_color: HexColor,
    text_color: HexColor,
    accent_color: HexColor,
    heading_font: String,
    body_font: String,
    logo_url: Option<String>,
    favicon_url: Option<String>,
    hero_image_url: Option<String>,
    loading_animation: LoadingAnimation,
    updated_at: DateTime<Utc>,
}

impl From<ThemeRow> for Theme {
    fn from(row: ThemeRow) -> Self {
        Self {
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            background_color: row.background_color,
            text_color: row.text_color,
            accent_color: row.accent_color,
            heading_font: row.heading_font,
            body_font: row.body_font,
            logo_url: row.logo_url,
            favicon_url: row.favicon_url,
            hero_image_url: row.hero_image_url,
            loading_animation: row.loading_animation,
            updated_at: Some(row.updated_at),
        }
    }
}

/// Repository for tenant themes.
pub struct ThemeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ThemeRepository<'a> {
    /// Create a new theme repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the stored theme for a tenant, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, tenant_id: TenantId) -> Result<Option<Theme>, RepositoryError> {
        let row: Option<ThemeRow> = sqlx::query_as(
            r"
            SELECT primary_color, secondary_color, background_color, text_color, accent_color,
                   heading_font, body_font, logo_url, favicon_url, hero_image_url,
                   loading_animation, updated_at
            FROM bandsite.theme
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert or replace a tenant's theme.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, tenant_id: TenantId, theme: &Theme) -> Result<Theme, RepositoryError> {
        let row: ThemeRow = sqlx::query_as(
            r"
            INSERT INTO bandsite.theme (
                tenant_id, primary_color, secondary_color, background_color, text_color,
                accent_color, heading_font, body_font, logo_url, favicon_url, hero_image_url,
                loading_animation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (tenant_id) DO UPDATE SET
                primary_color = EXCLUDED.primary_color,
                secondary_color = EXCLUDED.secondary_color,
                background_color = EXCLUDED.background_color,
                text_color = EXCLUDED.text_color,
                accent_color = EXCLUDED.accent_color,
                heading_font = EXCLUDED.heading_font,
                body_font = EXCLUDED.body_font,
                logo_url = EXCLUDED.logo_url,
                favicon_url = EXCLUDED.favicon_url,
                hero_image_url = EXCLUDED.hero_image_url,
                loading_animation = EXCLUDED.loading_animation,
                updated_at = NOW()
            RETURNING primary_color, secondary_color, background_color, text_color, accent_color,
                      heading_font, body_font, logo_url, favicon_url, hero_image_url,
                      loading_animation, updated_at
            ",
        )
        .bind(tenant_id)
        .bind(&theme.primary_color)
        .bind(&theme.secondary_color)
        .bind(&theme.background_color)
        .bind(&theme.text_color)
        .bind(&theme.accent_color)
        .bind(&theme.heading_font)
        .bind(&theme.body_font)
        .bind(&theme.logo_url)
        .bind(&theme.favicon_url)
        .bind(&theme.hero_image_url)
        .bind(theme.loading_animation)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
