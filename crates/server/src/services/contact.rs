//! Contact info validation.

use std::sync::LazyLock;

use regex::Regex;

use bandsite_core::Email;

use super::validation::{ValidationError, non_empty};
use crate::models::{ContactInfo, ContactInput};

const PHONE_MIN: usize = 7;
const PHONE_MAX: usize = 20;

/// One social platform and the URL shape it accepts.
struct Platform {
    field: &'static str,
    name: &'static str,
    pattern: LazyLock<Regex>,
}

macro_rules! platform {
    ($field:literal, $name:literal, $re:literal) => {
        Platform {
            field: $field,
            name: $name,
            pattern: LazyLock::new(|| Regex::new($re).expect("Invalid regex")),
        }
    };
}

static INSTAGRAM: Platform = platform!(
    "instagram_url",
    "Instagram",
    r"^https?://(www\.)?instagram\.com/[A-Za-z0-9_.]+/?$"
);
static FACEBOOK: Platform = platform!(
    "facebook_url",
    "Facebook",
    r"^https?://(www\.|m\.)?(facebook\.com|fb\.com)/[A-Za-z0-9_.\-]+(/[A-Za-z0-9_.\-]+)*/?(\?[^\s]*)?$"
);
static TWITTER: Platform = platform!(
    "twitter_url",
    "X/Twitter",
    r"^https?://(www\.)?(twitter\.com|x\.com)/[A-Za-z0-9_]{1,15}/?$"
);
static TIKTOK: Platform = platform!(
    "tiktok_url",
    "TikTok",
    r"^https?://(www\.)?tiktok\.com/@[A-Za-z0-9_.]+/?$"
);
static YOUTUBE: Platform = platform!(
    "youtube_url",
    "YouTube",
    r"^https?://(www\.|m\.)?youtube\.com/(channel/[A-Za-z0-9_\-]+|@[A-Za-z0-9_.\-]+|c/[A-Za-z0-9_.\-]+|user/[A-Za-z0-9_.\-]+)/?$"
);
static SPOTIFY: Platform = platform!(
    "spotify_url",
    "Spotify",
    r"^https?://open\.spotify\.com/(intl-[a-z\-]+/)?artist/[A-Za-z0-9]{22}/?(\?[^\s]*)?$"
);
static APPLE_MUSIC: Platform = platform!(
    "apple_music_url",
    "Apple Music",
    r"^https?://music\.apple\.com/[^\s]+$"
);
static BANDCAMP: Platform = platform!(
    "bandcamp_url",
    "Bandcamp",
    r"^https?://[a-z0-9\-]+\.bandcamp\.com(/[^\s]*)?$"
);
static SOUNDCLOUD: Platform = platform!(
    "soundcloud_url",
    "SoundCloud",
    r"^https?://(www\.|m\.)?soundcloud\.com/[A-Za-z0-9_\-]+/?$"
);

impl Platform {
    fn check(&self, value: Option<String>) -> Result<Option<String>, ValidationError> {
        match non_empty(value) {
            Some(url) if !self.pattern.is_match(&url) => Err(ValidationError::new(
                self.field,
                format!("must be a {} profile URL", self.name),
            )),
            other => Ok(other),
        }
    }
}

/// Validate a contact update. Empty values become `None`.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(input: ContactInput) -> Result<ContactInfo, ValidationError> {
    Ok(ContactInfo {
        booking_email: email("booking_email", input.booking_email)?,
        management_email: email("management_email", input.management_email)?,
        press_email: email("press_email", input.press_email)?,
        phone: phone(input.phone)?,
        instagram_url: INSTAGRAM.check(input.instagram_url)?,
        facebook_url: FACEBOOK.check(input.facebook_url)?,
        twitter_url: TWITTER.check(input.twitter_url)?,
        tiktok_url: TIKTOK.check(input.tiktok_url)?,
        youtube_url: YOUTUBE.check(input.youtube_url)?,
        spotify_url: SPOTIFY.check(input.spotify_url)?,
        apple_music_url: APPLE_MUSIC.check(input.apple_music_url)?,
        bandcamp_url: BANDCAMP.check(input.bandcamp_url)?,
        soundcloud_url: SOUNDCLOUD.check(input.soundcloud_url)?,
        updated_at: None,
    })
}

fn email(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    non_empty(value)
        .map(|v| {
            Email::normalized(&v)
                .map(Email::into_inner)
                .map_err(|e| ValidationError::new(field, e.to_string()))
        })
        .transpose()
}

fn phone(value: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(phone) = non_empty(value) else {
        return Ok(None);
    };

    let len = phone.chars().count();
    if !(PHONE_MIN..=PHONE_MAX).contains(&len) {
        return Err(ValidationError::new(
            "phone",
            format!("must be {PHONE_MIN}-{PHONE_MAX} characters"),
        ));
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '(' | ')' | '-' | '.'))
    {
        return Err(ValidationError::new(
            "phone",
            "may only contain digits, spaces and + ( ) - .",
        ));
    }

    Ok(Some(phone))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn with(f: impl FnOnce(&mut ContactInput)) -> Result<ContactInfo, ValidationError> {
        let mut input = ContactInput::default();
        f(&mut input);
        validate(input)
    }

    #[test]
    fn test_empty_input_is_all_none() {
        let contact = with(|c| c.booking_email = Some("  ".to_string())).unwrap();
        assert_eq!(contact, ContactInfo::default());
    }

    #[test]
    fn test_emails_normalised() {
        let contact = with(|c| c.press_email = Some(" Press@Owls.Band ".to_string())).unwrap();
        assert_eq!(contact.press_email.as_deref(), Some("press@owls.band"));

        let err = with(|c| c.booking_email = Some("not-an-email".to_string())).unwrap_err();
        assert_eq!(err.field, "booking_email");
    }

    #[test]
    fn test_phone_rules() {
        assert!(with(|c| c.phone = Some("+44 (0)20 7946-0958".to_string())).is_ok());
        assert_eq!(
            with(|c| c.phone = Some("12345".to_string())).unwrap_err().field,
            "phone"
        );
        assert!(with(|c| c.phone = Some("call 555 0100".to_string())).is_err());
        assert!(with(|c| c.phone = Some("1".repeat(21))).is_err());
    }

    #[test]
    fn test_social_urls_accept_their_platform() {
        let contact = with(|c| {
            c.instagram_url = Some("https://www.instagram.com/midnight.owls/".to_string());
            c.facebook_url = Some("https://fb.com/midnightowls".to_string());
            c.twitter_url = Some("https://x.com/midnight_owls".to_string());
            c.tiktok_url = Some("https://www.tiktok.com/@midnightowls".to_string());
            c.youtube_url = Some("https://www.youtube.com/@MidnightOwls".to_string());
            c.spotify_url =
                Some("https://open.spotify.com/artist/4uLU6hMCjMI75M1A2tKUQC?si=x".to_string());
            c.apple_music_url =
                Some("https://music.apple.com/us/artist/midnight-owls/123456".to_string());
            c.bandcamp_url = Some("https://midnightowls.bandcamp.com/".to_string());
            c.soundcloud_url = Some("https://soundcloud.com/midnight-owls".to_string());
        })
        .unwrap();

        assert_eq!(contact.social_links().len(), 9);
    }

    #[test]
    fn test_social_urls_reject_other_platforms() {
        let err = with(|c| c.instagram_url = Some("https://facebook.com/owls".to_string()))
            .unwrap_err();
        assert_eq!(err.field, "instagram_url");

        let err = with(|c| c.tiktok_url = Some("https://tiktok.com/owls".to_string())).unwrap_err();
        assert_eq!(err.field, "tiktok_url");

        let err = with(|c| {
            c.bandcamp_url = Some("https://bandcamp.com.evil.example/owls".to_string());
        })
        .unwrap_err();
        assert_eq!(err.field, "bandcamp_url");

        let err = with(|c| {
            c.youtube_url = Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string());
        })
        .unwrap_err();
        assert_eq!(err.field, "youtube_url");
    }
}
