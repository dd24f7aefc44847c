//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. Only admin
//! logins put anything in a session; public visitors never get a record.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bandsite_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key derived from the configured session secret.
fn signing_key(config: &ServerConfig) -> Key {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer over the shared `PostgreSQL` store.
///
/// The cookie is signed and host-only, so a session from one band's site is
/// never sent to another's.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let mut config = ServerConfig::for_tests();
        let first = signing_key(&config);
        assert_eq!(first.master(), signing_key(&config).master());

        config.session_secret = SecretString::from("y".repeat(32));
        assert_ne!(first.master(), signing_key(&config).master());
    }
}
