//! Tenant slug type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The slug is shorter than the minimum length.
    #[error("slug must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The slug is longer than a DNS label allows.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains something other than `a-z`, `0-9` or `-`.
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
    /// The slug starts or ends with a hyphen.
    #[error("slug cannot start or end with a hyphen")]
    EdgeHyphen,
    /// The slug is reserved for platform use.
    #[error("slug '{0}' is reserved")]
    Reserved(String),
}

/// A tenant slug, used as the band's subdomain.
///
/// ## Constraints
///
/// - Length: 3-63 characters (a single DNS label)
/// - Lowercase ASCII letters, digits and `-`
/// - No leading or trailing `-`
/// - Not one of [`Slug::RESERVED`]
///
/// ## Examples
///
/// ```
/// use bandsite_core::Slug;
///
/// assert!(Slug::parse("the-midnight-owls").is_ok());
/// assert!(Slug::parse("www").is_err());      // reserved
/// assert!(Slug::parse("-owls").is_err());    // leading hyphen
/// assert!(Slug::parse("Owls").is_err());     // uppercase
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Minimum slug length.
    pub const MIN_LENGTH: usize = 3;

    /// Maximum slug length (RFC 1035 label limit).
    pub const MAX_LENGTH: usize = 63;

    /// Labels that can never belong to a tenant.
    pub const RESERVED: &'static [&'static str] = &["www", "admin", "api", "app", "static", "mail"];

    /// Parse a `Slug` from a string.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.len() < Self::MIN_LENGTH {
            return Err(SlugError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(SlugError::InvalidCharacter);
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(SlugError::EdgeHyphen);
        }

        if Self::is_reserved(s) {
            return Err(SlugError::Reserved(s.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }

    /// Whether `label` is reserved for platform use.
    #[must_use]
    pub fn is_reserved(label: &str) -> bool {
        Self::RESERVED.contains(&label)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_slugs() {
        assert!(Slug::parse("owl").is_ok());
        assert!(Slug::parse("the-midnight-owls").is_ok());
        assert!(Slug::parse("band-2024").is_ok());
        assert!(Slug::parse(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_parse_length_bounds() {
        assert_eq!(Slug::parse("ab"), Err(SlugError::TooShort { min: 3 }));
        assert_eq!(
            Slug::parse(&"a".repeat(64)),
            Err(SlugError::TooLong { max: 63 })
        );
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert_eq!(Slug::parse("Owls"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("owls_band"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("owls.band"), Err(SlugError::InvalidCharacter));
    }

    #[test]
    fn test_parse_edge_hyphens() {
        assert_eq!(Slug::parse("-owls"), Err(SlugError::EdgeHyphen));
        assert_eq!(Slug::parse("owls-"), Err(SlugError::EdgeHyphen));
    }

    #[test]
    fn test_parse_reserved() {
        for label in Slug::RESERVED {
            if label.len() >= Slug::MIN_LENGTH {
                assert!(matches!(Slug::parse(label), Err(SlugError::Reserved(_))));
            }
        }
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let parsed: Result<Slug, _> = serde_json::from_str("\"-bad\"");
        assert!(parsed.is_err());

        let slug: Slug = serde_json::from_str("\"good-band\"").unwrap();
        assert_eq!(slug.as_str(), "good-band");
    }
}
