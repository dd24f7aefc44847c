//! Show validation and public listing.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use bandsite_core::{ShowSource, TenantId};

use super::validation::{ValidationError, optional_text, optional_url, required_text};
use crate::db::{RepositoryError, ShowRepository};
use crate::models::{BandsintownWidget, PublicShows, ShowInput, ShowSettings, ShowSettingsInput};

/// Most past shows returned on the public listing.
pub const PAST_SHOWS_LIMIT: i64 = 50;

const MAX_NAME_LENGTH: usize = 200;
const MAX_NOTES_LENGTH: usize = 2000;

/// Validate and normalise a show payload.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(input: ShowInput) -> Result<ShowInput, ValidationError> {
    Ok(ShowInput {
        date: input.date,
        doors_time: input.doors_time,
        venue: required_text("venue", &input.venue, MAX_NAME_LENGTH)?,
        city: required_text("city", &input.city, MAX_NAME_LENGTH)?,
        region: optional_text("region", input.region, MAX_NAME_LENGTH)?,
        country: required_text("country", &input.country, MAX_NAME_LENGTH)?,
        ticket_url: optional_url("ticket_url", input.ticket_url, &["http", "https"])?,
        sold_out: input.sold_out,
        notes: optional_text("notes", input.notes, MAX_NOTES_LENGTH)?,
    })
}

/// Validate a show settings update.
///
/// # Errors
///
/// Returns a `ValidationError` when Bandsintown is chosen without an artist.
pub fn validate_settings(input: ShowSettingsInput) -> Result<ShowSettings, ValidationError> {
    let artist = optional_text("bandsintown_artist", input.bandsintown_artist, MAX_NAME_LENGTH)?;

    if input.source == ShowSource::Bandsintown && artist.is_none() {
        return Err(ValidationError::new(
            "bandsintown_artist",
            "is required when the source is bandsintown",
        ));
    }

    Ok(ShowSettings {
        source: input.source,
        bandsintown_artist: artist,
    })
}

/// The public show listing for a tenant as of `today`.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn public_listing(
    pool: &PgPool,
    tenant_id: TenantId,
    today: NaiveDate,
) -> Result<PublicShows, RepositoryError> {
    let repo = ShowRepository::new(pool);
    let settings = repo.get_settings(tenant_id).await?;

    if let (ShowSource::Bandsintown, Some(artist)) = (settings.source, settings.bandsintown_artist)
    {
        return Ok(PublicShows::Bandsintown {
            widget: BandsintownWidget::new(artist),
        });
    }

    let upcoming = repo.list_upcoming(tenant_id, today).await?;
    let past = repo.list_past(tenant_id, today, PAST_SHOWS_LIMIT).await?;
    Ok(PublicShows::Manual { upcoming, past })
}

/// Today's date in UTC, the cutoff between upcoming and past shows.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ShowInput {
        ShowInput {
            date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            doors_time: None,
            venue: " The Lexington ".to_string(),
            city: "London".to_string(),
            region: Some(String::new()),
            country: "UK".to_string(),
            ticket_url: Some("https://tickets.example.com/owls".to_string()),
            sold_out: false,
            notes: None,
        }
    }

    #[test]
    fn test_validate_trims_and_nulls() {
        let show = validate(input()).unwrap();
        assert_eq!(show.venue, "The Lexington");
        assert_eq!(show.region, None);
    }

    #[test]
    fn test_validate_rejects_empty_venue() {
        let mut bad = input();
        bad.venue = "   ".to_string();
        assert_eq!(validate(bad).unwrap_err().field, "venue");
    }

    #[test]
    fn test_validate_rejects_non_http_ticket_url() {
        let mut bad = input();
        bad.ticket_url = Some("ftp://tickets.example.com".to_string());
        assert_eq!(validate(bad).unwrap_err().field, "ticket_url");
    }

    #[test]
    fn test_settings_bandsintown_needs_artist() {
        let err = validate_settings(ShowSettingsInput {
            source: ShowSource::Bandsintown,
            bandsintown_artist: Some("  ".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.field, "bandsintown_artist");

        let ok = validate_settings(ShowSettingsInput {
            source: ShowSource::Bandsintown,
            bandsintown_artist: Some("The Midnight Owls".to_string()),
        })
        .unwrap();
        assert_eq!(ok.bandsintown_artist.as_deref(), Some("The Midnight Owls"));
    }

    #[test]
    fn test_settings_manual_keeps_artist_optional() {
        let ok = validate_settings(ShowSettingsInput {
            source: ShowSource::Manual,
            bandsintown_artist: None,
        })
        .unwrap();
        assert_eq!(ok, ShowSettings::default());
    }
}
