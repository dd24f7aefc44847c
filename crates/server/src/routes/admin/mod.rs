//! Admin JSON API for the signed-in band admin.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin) or
//! [`RequireOwner`](crate::middleware::RequireOwner), so the tenant always comes
//! from the session and the host together.

pub mod contact;
pub mod merch;
pub mod newsletter;
pub mod players;
pub mod shows;
pub mod theme;
pub mod videos;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::services::embeds::EmbedError;
use crate::services::validation::ValidationError;
use crate::state::AppState;

/// Longest player or video title.
const MAX_TITLE_LENGTH: usize = 200;

/// A share link that could not be parsed, reported against its form field.
fn embed_error(field: &'static str, error: &EmbedError) -> AppError {
    ValidationError::new(field, error.to_string()).into()
}

/// A reorder list that does not match the stored set is a client error.
fn reorder_error(error: RepositoryError) -> AppError {
    match error {
        RepositoryError::Conflict(message) => AppError::BadRequest(message),
        other => other.into(),
    }
}

/// Create the admin routes router, nested under `/api/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Theme
        .route("/theme", get(theme::get).put(theme::update))
        // Shows
        .route("/shows", get(shows::list).post(shows::create))
        .route(
            "/shows/settings",
            get(shows::get_settings).put(shows::update_settings),
        )
        .route("/shows/{id}", put(shows::update).delete(shows::delete))
        // Contact
        .route("/contact", get(contact::get).put(contact::update))
        // Spotify players
        .route("/players", get(players::list).post(players::create))
        .route("/players/order", put(players::reorder))
        .route("/players/{id}", put(players::update).delete(players::delete))
        // YouTube videos
        .route("/videos", get(videos::list).post(videos::create))
        .route("/videos/order", put(videos::reorder))
        .route("/videos/{id}", put(videos::update).delete(videos::delete))
        // Merch (owner only)
        .route("/merch", get(merch::get).put(merch::update))
        // Newsletter
        .route("/newsletter/subscribers", get(newsletter::list))
        .route("/newsletter/subscribers/{id}", delete(newsletter::delete))
        .route("/newsletter/export.csv", get(newsletter::export))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_reorder_conflict_is_bad_request() {
        let err = reorder_error(RepositoryError::Conflict("ids do not match".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = reorder_error(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_embed_error_names_field() {
        match embed_error("spotify_url", &EmbedError::UnsupportedKind) {
            AppError::Validation(e) => {
                assert_eq!(e.field, "spotify_url");
                assert_eq!(e.message, "unsupported Spotify link type");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
