//! Spotify player repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bandsite_core::{PlayerId, SpotifyKind, TenantId};

use super::RepositoryError;
use crate::models::SpotifyPlayer;
use crate::services::embeds::{SpotifyEmbed, spotify_embed_url};

#[derive(Debug, sqlx::FromRow)]
struct PlayerRow {
    id: i32,
    spotify_url: String,
    kind: SpotifyKind,
    spotify_id: String,
    title: Option<String>,
    compact: bool,
    position: i32,
    created_at: DateTime<Utc>,
}

impl From<PlayerRow> for SpotifyPlayer {
    fn from(row: PlayerRow) -> Self {
        let embed_url = spotify_embed_url(row.kind, &row.spotify_id);
        Self {
            id: PlayerId::new(row.id),
            spotify_url: row.spotify_url,
            kind: row.kind,
            spotify_id: row.spotify_id,
            title: row.title,
            compact: row.compact,
            position: row.position,
            embed_url,
            created_at: row.created_at,
        }
    }
}

const PLAYER_COLUMNS: &str =
    "id, spotify_url, kind, spotify_id, title, compact, position, created_at";

/// Repository for a tenant's Spotify players.
pub struct PlayerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlayerRepository<'a> {
    /// Create a new player repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a tenant's players in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<SpotifyPlayer>, RepositoryError> {
        let rows: Vec<PlayerRow> = sqlx::query_as(&format!(
            "SELECT {PLAYER_COLUMNS} FROM bandsite.spotify_player \
             WHERE tenant_id = $1 ORDER BY position ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append a player after the tenant's last one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        spotify_url: &str,
        embed: &SpotifyEmbed,
        title: Option<&str>,
        compact: bool,
    ) -> Result<SpotifyPlayer, RepositoryError> {
        let row: PlayerRow = sqlx::query_as(&format!(
            "INSERT INTO bandsite.spotify_player \
                (tenant_id, spotify_url, kind, spotify_id, title, compact, position) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                (SELECT COALESCE(MAX(position) + 1, 0) FROM bandsite.spotify_player WHERE tenant_id = $1)) \
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(spotify_url)
        .bind(embed.kind)
        .bind(&embed.id)
        .bind(title)
        .bind(compact)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a player owned by the tenant. Position is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the player is not the tenant's.
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: PlayerId,
        spotify_url: &str,
        embed: &SpotifyEmbed,
        title: Option<&str>,
        compact: bool,
    ) -> Result<SpotifyPlayer, RepositoryError> {
        let row: Option<PlayerRow> = sqlx::query_as(&format!(
            "UPDATE bandsite.spotify_player SET \
                spotify_url = $3, kind = $4, spotify_id = $5, title = $6, compact = $7 \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(spotify_url)
        .bind(embed.kind)
        .bind(&embed.id)
        .bind(title)
        .bind(compact)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a player owned by the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the player is not the tenant's.
    pub async fn delete(&self, tenant_id: TenantId, id: PlayerId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM bandsite.spotify_player WHERE tenant_id = $1 AND id = $2")
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
    /// Returns `RepositoryError::Conflict` unless `ids` is exactly the tenant's player set.
    pub async fn reorder(&self, tenant_id: TenantId, ids: &[i32]) -> Result<(), RepositoryError> {
        super::reorder_positions(self.pool, "spotify_player", tenant_id, ids).await
    }
}
