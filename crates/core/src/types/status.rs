//! Status and option enums for tenant-owned records.
//!
//! Each enum maps to a `PostgreSQL` enum type in the `bandsite` schema when the
//! `postgres` feature is enabled, and serializes as `snake_case` in JSON.

use serde::{Deserialize, Serialize};

/// Newsletter subscriber status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.subscriber_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    #[default]
    Subscribed,
    Unsubscribed,
    /// Permanent bounce reported by SES. Never mailed again.
    Bounced,
    /// Spam complaint reported by SES. Never mailed again.
    Complained,
}

impl SubscriberStatus {
    /// Returns the wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Bounced => "bounced",
            Self::Complained => "complained",
        }
    }

    /// Whether this address is on the suppression list.
    #[must_use]
    pub const fn is_suppressed(self) -> bool {
        matches!(self, Self::Bounced | Self::Complained)
    }
}

impl std::fmt::Display for SubscriberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribed" => Ok(Self::Subscribed),
            "unsubscribed" => Ok(Self::Unsubscribed),
            "bounced" => Ok(Self::Bounced),
            "complained" => Ok(Self::Complained),
            _ => Err(format!("invalid subscriber status: {s}")),
        }
    }
}

/// Admin role with different permission levels within one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access, including merch credentials and subscriber exports.
    Owner,
    /// Can edit site content (theme, shows, players, contact).
    Editor,
}

impl AdminRole {
    /// Returns the wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Loading animation shown while the public site hydrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.loading_animation", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LoadingAnimation {
    None,
    #[default]
    Spinner,
    Pulse,
    Vinyl,
}

impl LoadingAnimation {
    /// Returns the wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Spinner => "spinner",
            Self::Pulse => "pulse",
            Self::Vinyl => "vinyl",
        }
    }
}

impl std::str::FromStr for LoadingAnimation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "spinner" => Ok(Self::Spinner),
            "pulse" => Ok(Self::Pulse),
            "vinyl" => Ok(Self::Vinyl),
            _ => Err(format!("invalid loading animation: {s}")),
        }
    }
}

/// Where a tenant's show listing comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.show_source", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShowSource {
    /// Shows entered by hand in the admin.
    #[default]
    Manual,
    /// The Bandsintown widget renders the listing client-side.
    Bandsintown,
}

/// Which storefront integration a tenant uses for merch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.merch_provider", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MerchProvider {
    #[default]
    None,
    Shopify,
    Stripe,
}

/// Kind of Spotify resource behind an embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bandsite.spotify_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SpotifyKind {
    Track,
    Album,
    Playlist,
    Artist,
    Episode,
    Show,
}

impl SpotifyKind {
    /// Returns the path segment Spotify uses for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Artist => "artist",
            Self::Episode => "episode",
            Self::Show => "show",
        }
    }
}

impl std::str::FromStr for SpotifyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            "playlist" => Ok(Self::Playlist),
            "artist" => Ok(Self::Artist),
            "episode" => Ok(Self::Episode),
            "show" => Ok(Self::Show),
            _ => Err(format!("invalid spotify kind: {s}")),
        }
    }
}
