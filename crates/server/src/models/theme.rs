//! Site theme types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bandsite_core::{HexColor, LoadingAnimation};

/// A tenant's validated theme.
///
/// Every field has already passed validation, so the values can be written
/// into CSS without further escaping.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Theme {
    pub primary_color: HexColor,
    pub secondary_color: HexColor,
    pub background_color: HexColor,
    pub text_color: HexColor,
    pub accent_color: HexColor,
    pub heading_font: String,
    pub body_font: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub loading_animation: LoadingAnimation,
    /// `None` for the built-in default theme.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: HexColor::from_static("#e63946"),
            secondary_color: HexColor::from_static("#1d3557"),
            background_color: HexColor::from_static("#0b0b0f"),
            text_color: HexColor::from_static("#f1faee"),
            accent_color: HexColor::from_static("#f4a261"),
            heading_font: "Bebas Neue".to_string(),
            body_font: "Inter".to_string(),
            logo_url: None,
            favicon_url: None,
            hero_image_url: None,
            loading_animation: LoadingAnimation::Spinner,
            updated_at: None,
        }
    }
}

/// Theme update submitted by the admin.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeInput {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    pub heading_font: String,
    pub body_font: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub loading_animation: LoadingAnimation,
}
