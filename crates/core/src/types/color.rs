//! Hex color type for theme configuration.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// The value does not start with `#`.
    #[error("color must start with '#'")]
    MissingHash,
    /// The value is not 3 or 6 hex digits after the `#`.
    #[error("color must be #RGB or #RRGGBB")]
    InvalidLength,
    /// The value contains a non-hex digit.
    #[error("color contains a non-hex digit")]
    InvalidDigit,
}

/// A CSS hex color, always stored as lowercase `#rrggbb`.
///
/// Short `#rgb` input is expanded, so `#F0A` becomes `#ff00aa`. Because the
/// normalised form is exactly seven characters of `#` and hex digits it can
/// be interpolated into a stylesheet without escaping.
///
/// ```
/// use bandsite_core::HexColor;
///
/// assert_eq!(HexColor::parse("#F0A").unwrap().as_str(), "#ff00aa");
/// assert!(HexColor::parse("red").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `HexColor` from `#RGB` or `#RRGGBB` (any case).
    ///
    /// # Errors
    ///
    /// Returns a [`ColorError`] if the input is not a hex color.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim().strip_prefix('#').ok_or(ColorError::MissingHash)?;

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit);
        }

        let digits = digits.to_ascii_lowercase();
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits,
            _ => return Err(ColorError::InvalidLength),
        };

        Ok(Self(format!("#{expanded}")))
    }

    /// Construct from a literal known to be valid. Used for built-in defaults.
    ///
    /// Falls back to black if the literal is malformed.
    #[must_use]
    pub fn from_static(s: &'static str) -> Self {
        Self::parse(s).unwrap_or_else(|_| Self("#000000".to_owned()))
    }

    /// Returns the color as a string slice (`#rrggbb`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for HexColor {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for HexColor {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for HexColor {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
