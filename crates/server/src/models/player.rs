//! Music player types: Spotify embeds and YouTube videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bandsite_core::{PlayerId, SpotifyKind, VideoId};

/// A Spotify embed on the tenant's site.
#[derive(Debug, Clone, Serialize)]
pub struct SpotifyPlayer {
    pub id: PlayerId,
    /// URL as entered by the admin.
    pub spotify_url: String,
    pub kind: SpotifyKind,
    pub spotify_id: String,
    pub title: Option<String>,
    /// Use the 152px compact player instead of the full-height one.
    pub compact: bool,
    pub position: i32,
    /// `https://open.spotify.com/embed/{kind}/{id}`
    pub embed_url: String,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a Spotify player.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInput {
    pub spotify_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub compact: bool,
}

/// A YouTube video embed.
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: VideoId,
    /// URL as entered by the admin.
    pub youtube_url: String,
    pub video_id: String,
    pub title: Option<String>,
    pub position: i32,
    /// `https://www.youtube-nocookie.com/embed/{id}`
    pub embed_url: String,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a video.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInput {
    pub youtube_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// New display order, as the full list of ids.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderInput {
    pub ids: Vec<i32>,
}
