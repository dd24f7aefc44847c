//! Integration tests for Bandsite.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate, create two tenants, an owner without 2FA and a second admin
//! # the two-factor tests enrol and unenrol
//! bandsite-cli migrate
//! bandsite-cli tenant create -s dev-band -n "Dev Band"
//! bandsite-cli tenant create -s other-band -n "Other Band"
//! export BANDSITE_ADMIN_PASSWORD=integration-pass-123
//! bandsite-cli admin create -t dev-band -e owner@example.com -n Owner
//! bandsite-cli admin create -t dev-band -e twofactor@example.com -n Editor -r editor
//!
//! # Start the server with BANDSITE_DEV_TENANT=dev-band, then
//! cargo test -p bandsite-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BANDSITE_TEST_URL` - server base URL (default `http://localhost:3000`)
//! - `BANDSITE_TEST_ADMIN_EMAIL` - owner email (default `owner@example.com`)
//! - `BANDSITE_TEST_ADMIN_PASSWORD` - password of both admins (default `integration-pass-123`)
//! - `BANDSITE_TEST_TOTP_EMAIL` - admin used for 2FA tests (default `twofactor@example.com`)
//! - `BANDSITE_TEST_OTHER_HOST` - host of the second tenant (default `other-band.bandsite.app`)

#![allow(clippy::missing_panics_doc)]

use bandsite_server::services::auth::totp;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the running server.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BANDSITE_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// `{base_url}{path}`
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Password shared by the test admins.
#[must_use]
pub fn admin_password() -> String {
    env_or("BANDSITE_TEST_ADMIN_PASSWORD", "integration-pass-123")
}

/// Email of the admin the two-factor tests enrol.
#[must_use]
pub fn totp_admin_email() -> String {
    env_or("BANDSITE_TEST_TOTP_EMAIL", "twofactor@example.com")
}

/// Host that resolves to the second tenant.
#[must_use]
pub fn other_site_host() -> String {
    env_or("BANDSITE_TEST_OTHER_HOST", "other-band.bandsite.app")
}

/// A client that keeps the session cookie between requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Send from a random client address so rate limits don't leak between tests.
#[must_use]
pub fn from_fresh_ip(request: RequestBuilder) -> RequestBuilder {
    let b = Uuid::new_v4().into_bytes();
    request.header("x-forwarded-for", format!("10.{}.{}.{}", b[0], b[1], b[2]))
}

/// Password step of a login. Returns the status and JSON body.
pub async fn login(client: &Client, email: &str, password: &str) -> (StatusCode, Value) {
    let resp = from_fresh_ip(client.post(url("/api/auth/login")))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to log in");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

/// Second login step. Returns the status and JSON body.
pub async fn verify_code(client: &Client, code: &str) -> (StatusCode, Value) {
    let resp = from_fresh_ip(client.post(url("/api/auth/2fa/verify")))
        .json(&json!({"code": code}))
        .send()
        .await
        .expect("Failed to send code");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

/// The current TOTP code for a base32 secret.
#[must_use]
pub fn current_totp(secret_b32: &str) -> String {
    let secret = totp::decode_secret(secret_b32).expect("Invalid TOTP secret");
    let step = totp::step_at(chrono::Utc::now().timestamp());
    totp::code_at(&secret, step).expect("Failed to compute TOTP code")
}

/// A client logged in as the test owner.
pub async fn admin_client() -> Client {
    let client = client();
    let email = env_or("BANDSITE_TEST_ADMIN_EMAIL", "owner@example.com");

    let (status, _) = login(&client, &email, &admin_password()).await;
    assert_eq!(status, StatusCode::OK, "test admin login failed");

    client
}
