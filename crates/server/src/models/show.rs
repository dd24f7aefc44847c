//! Show (gig) listing types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use bandsite_core::{ShowId, ShowSource};

/// Script that renders the Bandsintown events widget.
pub const BANDSINTOWN_WIDGET_SCRIPT: &str = "https://widget.bandsintown.com/main.min.js";

/// A show entered in the admin.
#[derive(Debug, Clone, Serialize)]
pub struct Show {
    pub id: ShowId,
    pub date: NaiveDate,
    pub doors_time: Option<NaiveTime>,
    pub venue: String,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub ticket_url: Option<String>,
    pub sold_out: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a show.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowInput {
    pub date: NaiveDate,
    #[serde(default)]
    pub doors_time: Option<NaiveTime>,
    pub venue: String,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub sold_out: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Where the public show listing comes from.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ShowSettings {
    pub source: ShowSource,
    pub bandsintown_artist: Option<String>,
}

/// Update payload for [`ShowSettings`].
#[derive(Debug, Clone, Deserialize)]
pub struct ShowSettingsInput {
    pub source: ShowSource,
    #[serde(default)]
    pub bandsintown_artist: Option<String>,
}

/// Descriptor the public site uses to mount the Bandsintown widget.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BandsintownWidget {
    pub artist_name: String,
    pub script_url: &'static str,
}

impl BandsintownWidget {
    #[must_use]
    pub fn new(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            script_url: BANDSINTOWN_WIDGET_SCRIPT,
        }
    }
}

/// Public show listing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PublicShows {
    Manual { upcoming: Vec<Show>, past: Vec<Show> },
    Bandsintown { widget: BandsintownWidget },
}
