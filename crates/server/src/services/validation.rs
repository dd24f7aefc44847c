//! Field validation shared by the admin update operations.

use thiserror::Error;
use url::Url;

/// A submitted field failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field as it appears in the request.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim a value and map empty strings to `None`.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Required text of 1..=`max` characters after trimming.
///
/// # Errors
///
/// Returns a `ValidationError` if the text is empty or too long.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}

/// Optional text of at most `max` characters; empty becomes `None`.
///
/// # Errors
///
/// Returns a `ValidationError` if the text is too long.
pub fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match non_empty(value) {
        Some(v) if v.chars().count() > max => Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        )),
        other => Ok(other),
    }
}

/// Optional absolute URL whose scheme is in `schemes`; empty becomes `None`.
///
/// # Errors
///
/// Returns a `ValidationError` if the URL does not parse, has no host or
/// uses another scheme.
pub fn optional_url(
    field: &'static str,
    value: Option<String>,
    schemes: &[&str],
) -> Result<Option<String>, ValidationError> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };

    let url = Url::parse(&value).map_err(|_| ValidationError::new(field, "must be a valid URL"))?;

    if !schemes.contains(&url.scheme()) {
        return Err(ValidationError::new(
            field,
            format!("must use {}", schemes.join(" or ")),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::new(field, "must include a host"));
    }

    Ok(Some(value))
}

/// Optional `https` URL.
///
/// # Errors
///
/// See [`optional_url`].
pub fn optional_https_url(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    optional_url(field, value, &["https"])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("venue", " The Lexington ", 200).unwrap(), "The Lexington");
        assert_eq!(
            required_text("venue", "  ", 200),
            Err(ValidationError::new("venue", "is required"))
        );
        assert!(required_text("venue", &"x".repeat(201), 200).is_err());
    }

    #[test]
    fn test_optional_https_url() {
        assert_eq!(
            optional_https_url("logo_url", Some("https://cdn.example.com/logo.png".to_string()))
                .unwrap(),
            Some("https://cdn.example.com/logo.png".to_string())
        );
        assert_eq!(optional_https_url("logo_url", Some(String::new())).unwrap(), None);
        assert!(optional_https_url("logo_url", Some("http://cdn.example.com/a.png".to_string())).is_err());
        assert!(optional_https_url("logo_url", Some("javascript:alert(1)".to_string())).is_err());
        assert!(optional_https_url("logo_url", Some("not a url".to_string())).is_err());
    }

    #[test]
    fn test_optional_url_allows_http_when_asked() {
        let url = optional_url(
            "ticket_url",
            Some("http://tickets.example.com/1".to_string()),
            &["http", "https"],
        )
        .unwrap();
        assert!(url.is_some());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("phone", "is too short");
        assert_eq!(err.to_string(), "phone: is too short");
    }
}
