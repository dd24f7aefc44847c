//! Email addresses for newsletter subscribers and site admins.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
    /// Whitespace, or a second `@`.
    #[error("email contains invalid characters")]
    InvalidCharacters,
}

/// A structurally valid email address.
///
/// Subscribers and admins are both keyed by address within a tenant, and the
/// database compares addresses byte for byte. Anything that is stored or
/// looked up goes through [`Email::normalized`] (or [`Email::to_normalized`]
/// for an already-parsed value) so that `Fan@Example.com` and
/// `fan@example.com` land on the same row.
///
/// Only the shape is checked: one `@`, something either side, no whitespace,
/// at most 254 characters. Undeliverable addresses surface as SES bounces.
///
/// ```
/// use bandsite_core::Email;
///
/// let fan = Email::normalized(" Fan@Example.com ").unwrap();
/// assert_eq!(fan.as_str(), "fan@example.com");
///
/// assert!(Email::parse("owner@midnightowls.com").is_ok());
/// assert!(Email::parse("midnightowls.com").is_err());
/// assert!(Email::parse("owner@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address SMTP will carry (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Validate an address, keeping it exactly as given.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmailError`] the input trips.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let at = s.find('@').ok_or(EmailError::MissingAtSymbol)?;
        if s.matches('@').count() > 1 || s.chars().any(char::is_whitespace) {
            return Err(EmailError::InvalidCharacters);
        }
        if at == 0 {
            return Err(EmailError::EmptyLocalPart);
        }
        if at == s.len() - 1 {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Trim and lowercase, then validate. This is the form stored for
    /// subscribers and admins, and the form every lookup uses.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Email::parse`].
    pub fn normalized(s: &str) -> Result<Self, EmailError> {
        Self::parse(&s.trim().to_lowercase())
    }

    /// The lookup form of an address that was parsed as typed.
    #[must_use]
    pub fn to_normalized(&self) -> Self {
        Self(self.0.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Rows were validated on the way in.
        Ok(Self(<String as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
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
    fn test_accepts_typical_signups() {
        for address in [
            "fan@example.com",
            "first.last+gigs@mail.example.co.uk",
            "booking@midnightowls.com",
            "a@b.c",
        ] {
            assert!(Email::parse(address).is_ok(), "{address}");
        }
    }

    #[test]
    fn test_rejects_malformed_signups() {
        assert!(matches!(Email::parse(""), Err(EmailError::Empty)));
        assert!(matches!(
            Email::parse("fan.example.com"),
            Err(EmailError::MissingAtSymbol)
        ));
        assert!(matches!(
            Email::parse("@example.com"),
            Err(EmailError::EmptyLocalPart)
        ));
        assert!(matches!(
            Email::parse("fan@"),
            Err(EmailError::EmptyDomain)
        ));
        assert!(matches!(
            Email::parse("fan@band@example.com"),
            Err(EmailError::InvalidCharacters)
        ));
        assert!(matches!(
            Email::parse("fan name@example.com"),
            Err(EmailError::InvalidCharacters)
        ));
    }

    #[test]
    fn test_rejects_addresses_smtp_cannot_carry() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        ));
    }

    #[test]
    fn test_normalized_signup_matches_existing_subscriber() {
        let stored = Email::normalized("fan@example.com").unwrap();
        let again = Email::normalized("  FAN@Example.COM\n").unwrap();
        assert_eq!(stored, again);
    }

    #[test]
    fn test_admin_typed_with_capitals_matches_login_key() {
        let typed = Email::parse("Owner@MidnightOwls.com").unwrap();
        let login_key = Email::normalized("owner@midnightowls.com").unwrap();

        assert_ne!(typed, login_key);
        assert_eq!(typed.to_normalized(), login_key);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("fan@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"fan@example.com\"");
        assert_eq!(serde_json::from_str::<Email>(&json).unwrap(), email);
        assert_eq!(email.to_string(), "fan@example.com");
    }
}
