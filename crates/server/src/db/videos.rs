//! YouTube video repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::{TenantId, VideoId};

use super::RepositoryError;
use crate::models::Video;
use crate::services::embeds::youtube_embed_url;

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: i32,
    youtube_url: String,
    video_id: String,
    title: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        let embed_url = youtube_embed_url(&row.video_id);
        Self {
            id: VideoId::new(row.id),
            youtube_url: row.youtube_url,
            video_id: row.video_id,
            title: row.title,
            position: row.position,
            embed_url,
            created_at: row.created_at,
        }
    }
}

const VIDEO_COLUMNS: &str = "id, youtube_url, video_id, title, position, created_at";

/// Repository for a tenant's videos.
pub struct VideoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VideoRepository<'a> {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a tenant's videos in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<Video>, RepositoryError> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {VIDEO_COLUMNS} FROM bandsite.video \
             WHERE tenant_id = $1 ORDER BY position ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append a video after the tenant's last one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        youtube_url: &str,
        video_id: &str,
        title: Option<&str>,
    ) -> Result<Video, RepositoryError> {
        let row: VideoRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.video (tenant_id, youtube_url, video_id, title, position) \
             VALUES ($1, $2, $3, $4, \
                (SELECT COALESCE(MAX(position) + 1, 0) FROM bandsite.video WHERE tenant_id = $1)) \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(youtube_url)
        .bind(video_id)
        .bind(title)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a video owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the video is not the tenant's.
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: VideoId,
        youtube_url: &str,
        video_id: &str,
        title: Option<&str>,
    ) -> Result<Video, RepositoryError> {
        let row: Option<VideoRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.video SET youtube_url = $3, video_id = $4, title = $5 \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(youtube_url)
        .bind(video_id)
        .bind(title)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a video owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the video is not the tenant's.
    pub async fn delete(&self, tenant_id: TenantId, id: VideoId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bandsite.video WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Rewrite positions to follow `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` unless `ids` is exactly the tenant's video set.
    pub async fn reorder(&self, tenant_id: TenantId, ids: &[i32]) -> Result<(), RepositoryError> {
        super::reorder_positions(self.pool, "video", tenant_id, ids).await
    }
}
