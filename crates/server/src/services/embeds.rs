//! Spotify and YouTube URL parsing for embedded players.
//!
//! Admins paste share links; only the resource kind and ID are kept, and
//! embed URLs are always rebuilt from those, never taken from input.

use std::str::FromStr;

use thiserror::Error;
use url::Url;

use bandsite_core::SpotifyKind;

/// Length of a Spotify base62 resource ID.
const SPOTIFY_ID_LENGTH: usize = 22;

/// Length of a YouTube video ID.
const YOUTUBE_ID_LENGTH: usize = 11;

/// Errors from parsing a share link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("not a valid URL")]
    InvalidUrl,
    #[error("URL is not a {0} link")]
    UnsupportedHost(&'static str),
    #[error("unsupported Spotify link type")]
    UnsupportedKind,
    #[error("link does not contain a valid ID")]
    InvalidId,
}

/// A Spotify resource that can be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyEmbed {
    pub kind: SpotifyKind,
    pub id: String,
}

impl SpotifyEmbed {
    #[must_use]
    pub fn embed_url(&self) -> String {
        spotify_embed_url(self.kind, &self.id)
    }
}

/// `https://open.spotify.com/embed/{kind}/{id}`
#[must_use]
pub fn spotify_embed_url(kind: SpotifyKind, id: &str) -> String {
    format!("https://open.spotify.com/embed/{}/{id}", kind.as_str())
}

/// `https://www.youtube-nocookie.com/embed/{id}`
#[must_use]
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube-nocookie.com/embed/{video_id}")
}

/// Parse an `open.spotify.com` link or a `spotify:` URI.
///
/// Accepts `https://open.spotify.com/[intl-xx/]{kind}/{id}` (query string
/// ignored) and `spotify:{kind}:{id}`.
///
/// # Errors
///
/// Returns an `EmbedError` describing why the link was rejected.
pub fn parse_spotify_url(input: &str) -> Result<SpotifyEmbed, EmbedError> {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        let (Some(kind), Some(id), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmbedError::InvalidUrl);
        };
        return spotify_parts(kind, id);
    }

    let url = Url::parse(input).map_err(|_| EmbedError::InvalidUrl)?;
    if !matches!(url.scheme(), "https" | "http") || url.host_str() != Some("open.spotify.com") {
        return Err(EmbedError::UnsupportedHost("Spotify"));
    }

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.first().is_some_and(|s| is_intl_segment(s)) {
        segments.remove(0);
    }
    if segments.first() == Some(&"embed") {
        segments.remove(0);
    }

    match segments.as_slice() {
        [kind, id] => spotify_parts(kind, id),
        _ => Err(EmbedError::UnsupportedKind),
    }
}

fn spotify_parts(kind: &str, id: &str) -> Result<SpotifyEmbed, EmbedError> {
    let kind = SpotifyKind::from_str(kind).map_err(|_| EmbedError::UnsupportedKind)?;
    if id.len() != SPOTIFY_ID_LENGTH || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(EmbedError::InvalidId);
    }
    Ok(SpotifyEmbed {
        kind,
        id: id.to_string(),
    })
}

/// `intl-de`, `intl-pt`, ...
fn is_intl_segment(segment: &str) -> bool {
    segment.strip_prefix("intl-").is_some_and(|locale| {
        !locale.is_empty()
            && locale.len() <= 5
            && locale.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-')
    })
}

/// Extract the 11-character video ID from a YouTube link.
///
/// Accepts `youtube.com/watch?v=`, `youtu.be/`, `youtube.com/embed/`,
/// `youtube.com/shorts/`, `youtube.com/live/`, on `www.`, `m.` and `music.`
/// hosts.
///
/// # Errors
///
/// Returns an `EmbedError` describing why the link was rejected.
pub fn parse_youtube_url(input: &str) -> Result<String, EmbedError> {
    let url = Url::parse(input.trim()).map_err(|_| EmbedError::InvalidUrl)?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(EmbedError::UnsupportedHost("YouTube"));
    }

    let host = url.host_str().unwrap_or_default();
    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "music.youtube.com"
        | "www.youtube-nocookie.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => return Err(EmbedError::UnsupportedHost("YouTube")),
    };

    let id = candidate.ok_or(EmbedError::InvalidId)?;
    if id.len() != YOUTUBE_ID_LENGTH
        || !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(EmbedError::InvalidId);
    }

    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TRACK_ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

    #[test]
    fn test_spotify_track_url() {
        let embed =
            parse_spotify_url(&format!("https://open.spotify.com/track/{TRACK_ID}?si=abc123"))
                .unwrap();
        assert_eq!(embed.kind, SpotifyKind::Track);
        assert_eq!(embed.id, TRACK_ID);
        assert_eq!(
            embed.embed_url(),
            format!("https://open.spotify.com/embed/track/{TRACK_ID}")
        );
    }

    #[test]
    fn test_spotify_intl_prefix() {
        let embed =
            parse_spotify_url(&format!("https://open.spotify.com/intl-de/album/{TRACK_ID}"))
                .unwrap();
        assert_eq!(embed.kind, SpotifyKind::Album);
    }

    #[test]
    fn test_spotify_uri() {
        let embed = parse_spotify_url(&format!("spotify:playlist:{TRACK_ID}")).unwrap();
        assert_eq!(embed.kind, SpotifyKind::Playlist);
        assert_eq!(embed.id, TRACK_ID);
    }

    #[test]
    fn test_spotify_artist_and_episode() {
        assert_eq!(
            parse_spotify_url(&format!("https://open.spotify.com/artist/{TRACK_ID}"))
                .unwrap()
                .kind,
            SpotifyKind::Artist
        );
        assert_eq!(
            parse_spotify_url(&format!("https://open.spotify.com/episode/{TRACK_ID}"))
                .unwrap()
                .kind,
            SpotifyKind::Episode
        );
    }

    #[test]
    fn test_spotify_rejects() {
        assert_eq!(
            parse_spotify_url(&format!("https://evil.example.com/track/{TRACK_ID}")),
            Err(EmbedError::UnsupportedHost("Spotify"))
        );
        assert_eq!(
            parse_spotify_url(&format!("https://open.spotify.com/user/{TRACK_ID}")),
            Err(EmbedError::UnsupportedKind)
        );
        assert_eq!(
            parse_spotify_url("https://open.spotify.com/track/short"),
            Err(EmbedError::InvalidId)
        );
        assert_eq!(
            parse_spotify_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKU-C"),
            Err(EmbedError::InvalidId)
        );
        assert_eq!(parse_spotify_url("not a url"), Err(EmbedError::InvalidUrl));
    }

    #[test]
    fn test_youtube_variants() {
        let id = "dQw4w9WgXcQ";
        for url in [
            format!("https://www.youtube.com/watch?v={id}"),
            format!("https://www.youtube.com/watch?feature=share&v={id}&t=42"),
            format!("https://youtu.be/{id}"),
            format!("https://youtu.be/{id}?si=xyz"),
            format!("https://www.youtube.com/embed/{id}"),
            format!("https://youtube.com/shorts/{id}"),
            format!("https://m.youtube.com/watch?v={id}"),
            format!("https://music.youtube.com/watch?v={id}"),
        ] {
            assert_eq!(parse_youtube_url(&url).unwrap(), id, "{url}");
        }
    }

    #[test]
    fn test_youtube_embed_url() {
        assert_eq!(
            youtube_embed_url("dQw4w9WgXcQ"),
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_youtube_rejects() {
        assert_eq!(
            parse_youtube_url("https://vimeo.com/12345"),
            Err(EmbedError::UnsupportedHost("YouTube"))
        );
        assert_eq!(
            parse_youtube_url("https://www.youtube.com/watch?v=short"),
            Err(EmbedError::InvalidId)
        );
        assert_eq!(
            parse_youtube_url("https://www.youtube.com/channel/UC123"),
            Err(EmbedError::InvalidId)
        );
        assert_eq!(parse_youtube_url("youtube"), Err(EmbedError::InvalidUrl));
    }
}
