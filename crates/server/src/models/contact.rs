//! Contact and social link types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant's contact details and social links.
///
/// Empty values are stored as `NULL` and serialized as `null`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub booking_email: Option<String>,
    pub management_email: Option<String>,
    pub press_email: Option<String>,
    pub phone: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub youtube_url: Option<String>,
    pub spotify_url: Option<String>,
    pub apple_music_url: Option<String>,
    pub bandcamp_url: Option<String>,
    pub soundcloud_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContactInfo {
    /// Social links that are set, as `(platform label, url)` pairs.
    #[must_use]
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("Instagram", &self.instagram_url),
            ("Facebook", &self.facebook_url),
            ("X", &self.twitter_url),
            ("TikTok", &self.tiktok_url),
            ("YouTube", &self.youtube_url),
            ("Spotify", &self.spotify_url),
            ("Apple Music", &self.apple_music_url),
            ("Bandcamp", &self.bandcamp_url),
            ("SoundCloud", &self.soundcloud_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.as_deref().map(|u| (label, u)))
        .collect()
    }
}

/// Update payload for [`ContactInfo`]. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub booking_email: Option<String>,
    pub management_email: Option<String>,
    pub press_email: Option<String>,
    pub phone: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub youtube_url: Option<String>,
    pub spotify_url: Option<String>,
    pub apple_music_url: Option<String>,
    pub bandcamp_url: Option<String>,
    pub soundcloud_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_links_skips_unset() {
        let contact = ContactInfo {
            instagram_url: Some("https://instagram.com/owls".to_string()),
            bandcamp_url: Some("https://owls.bandcamp.com".to_string()),
            ..ContactInfo::default()
        };

        let links = contact.social_links();
        assert_eq!(
            links,
            vec![
                ("Instagram", "https://instagram.com/owls"),
                ("Bandcamp", "https://owls.bandcamp.com"),
            ]
        );
    }
}
