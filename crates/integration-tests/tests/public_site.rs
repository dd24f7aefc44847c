//! Integration tests for the public band site.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running with `BANDSITE_DEV_TENANT` set to an active tenant
//!
//! Run with: cargo test -p bandsite-integration-tests -- --ignored

use bandsite_integration_tests::{client, url};
use reqwest::{StatusCode, header};
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoints() {
    let client = client();

    let resp = client.get(url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_homepage_renders_with_security_headers() {
    let resp = client().get(url("/")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(resp.headers().contains_key("content-security-policy"));
    assert!(resp.headers().contains_key("x-request-id"));

    let body = resp.text().await.unwrap();
    assert!(body.contains("/theme.css"));
    assert!(body.contains("/newsletter/signup"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_theme_css_is_cacheable() {
    let resp = client().get(url("/theme.css")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
    assert!(resp.text().await.unwrap().contains(":root"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_public_api_shapes() {
    let client = client();

    let site: Value = client.get(url("/api/site")).send().await.unwrap().json().await.unwrap();
    assert!(site["slug"].is_string());
    assert!(site["url"].as_str().unwrap().starts_with("http"));

    let players: Value = client
        .get(url("/api/players"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(players.is_array());

    let shows: Value = client.get(url("/api/shows")).send().await.unwrap().json().await.unwrap();
    assert!(shows["source"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_unknown_unsubscribe_token() {
    let resp = client()
        .get(url("/newsletter/unsubscribe?token=not-a-token"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_ses_webhook_rejects_bad_token() {
    let resp = client()
        .post(url("/webhooks/ses?token=wrong"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
