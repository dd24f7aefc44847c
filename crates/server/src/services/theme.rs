//! Theme validation and CSS variable rendering.

use std::fmt::Write as _;

use sqlx::PgPool;

use bandsite_core::{HexColor, TenantId};

use super::validation::{ValidationError, optional_https_url};
use crate::db::{RepositoryError, ThemeRepository};
use crate::models::{Theme, ThemeInput};

/// Longest accepted font family name.
pub const MAX_FONT_LENGTH: usize = 64;

/// A tenant's theme, or the default when none is stored.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
pub async fn load(pool: &PgPool, tenant_id: TenantId) -> Result<Theme, RepositoryError> {
    Ok(ThemeRepository::new(pool)
        .get(tenant_id)
        .await?
        .unwrap_or_default())
}

/// Validate an admin theme update.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate(input: ThemeInput) -> Result<Theme, ValidationError> {
    Ok(Theme {
        primary_color: color("primary_color", &input.primary_color)?,
        secondary_color: color("secondary_color", &input.secondary_color)?,
        background_color: color("background_color", &input.background_color)?,
        text_color: color("text_color", &input.text_color)?,
        accent_color: color("accent_color", &input.accent_color)?,
        heading_font: font("heading_font", &input.heading_font)?,
        body_font: font("body_font", &input.body_font)?,
        logo_url: optional_https_url("logo_url", input.logo_url)?,
        favicon_url: optional_https_url("favicon_url", input.favicon_url)?,
        hero_image_url: optional_https_url("hero_image_url", input.hero_image_url)?,
        loading_animation: input.loading_animation,
        updated_at: None,
    })
}

fn color(field: &'static str, value: &str) -> Result<HexColor, ValidationError> {
    HexColor::parse(value).map_err(|e| ValidationError::new(field, e.to_string()))
}

fn font(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_FONT_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("must be 1-{MAX_FONT_LENGTH} characters"),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::new(
            field,
            "may only contain letters, digits, spaces and hyphens",
        ));
    }
    Ok(value.to_string())
}

/// Render the theme as CSS custom properties on `:root`.
///
/// Values come from a validated [`Theme`], so none of them can contain
/// quotes, semicolons or braces.
#[must_use]
pub fn css_variables(theme: &Theme) -> String {
    let mut css = String::with_capacity(512);
    css.push_str(":root {\n");

    let colors = [
        ("primary", &theme.primary_color),
        ("secondary", &theme.secondary_color),
        ("background", &theme.background_color),
        ("text", &theme.text_color),
        ("accent", &theme.accent_color),
    ];
    for (name, value) in colors {
        let _ = writeln!(css, "  --color-{name}: {value};");
    }

    let _ = writeln!(css, "  --font-heading: \"{}\", sans-serif;", theme.heading_font);
    let _ = writeln!(css, "  --font-body: \"{}\", sans-serif;", theme.body_font);
    let _ = writeln!(
        css,
        "  --loading-animation: {};",
        theme.loading_animation.as_str()
    );

    css.push_str("}\n");
    css
}

/// Google Fonts stylesheet for the theme's heading and body fonts.
#[must_use]
pub fn fonts_stylesheet_url(theme: &Theme) -> String {
    let mut families = vec![theme.heading_font.as_str()];
    if theme.body_font != theme.heading_font {
        families.push(theme.body_font.as_str());
    }

    let query = families
        .iter()
        .map(|f| format!("family={}", urlencoding::encode(f).replace("%20", "+")))
        .collect::<Vec<_>>()
        .join("&");
    format!("https://fonts.googleapis.com/css2?{query}&display=swap")
}
