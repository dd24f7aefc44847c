//! Integration tests for admin auth and content management.
//!
//! Run with: cargo test -p bandsite-integration-tests -- --ignored

use bandsite_integration_tests::{admin_client, client, login, other_site_host, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_api_requires_login() {
    let resp = client().get(url("/api/admin/theme")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client().get(url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_cannot_manage_another_band() {
    let admin = admin_client().await;

    let resp = admin.get(url("/api/admin/theme")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let other = other_site_host();
    let resp = admin
        .get(url("/api/admin/theme"))
        .header("x-forwarded-host", &other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = admin
        .put(url("/api/admin/contact"))
        .header("x-forwarded-host", &other)
        .json(&json!({"booking_email": "hijack@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The other band's public data is untouched
    let contact: Value = client()
        .get(url("/api/contact"))
        .header("x-forwarded-host", &other)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_ne!(contact["booking_email"], "hijack@example.com");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_wrong_password_is_rejected() {
    let (status, _) = login(&client(), "owner@example.com", "definitely-wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same answer for an address that has no admin
    let (status, _) = login(&client(), "nobody@example.com", "definitely-wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_me_and_sessions() {
    let admin = admin_client().await;

    let me: Value = admin.get(url("/api/auth/me")).send().await.unwrap().json().await.unwrap();
    assert_eq!(me["role"], "owner");

    let sessions: Value = admin
        .get(url("/api/auth/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        sessions
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["current"] == true)
    );

    let resp = admin.post(url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin.get(url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_show_lifecycle() {
    let admin = admin_client().await;

    let resp = admin
        .post(url("/api/admin/shows"))
        .json(&json!({
            "date": "2099-06-01",
            "venue": "Integration Hall",
            "city": "Testville",
            "country": "US",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let show: Value = resp.json().await.unwrap();
    let id = show["id"].as_i64().unwrap();

    let resp = admin
        .post(url("/api/admin/shows"))
        .json(&json!({"date": "2099-06-01", "venue": "", "city": "X", "country": "US"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = admin
        .delete(url(&format!("/api/admin/shows/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_player_add_and_reorder() {
    let admin = admin_client().await;

    let resp = admin
        .post(url("/api/admin/players"))
        .json(&json!({"spotify_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = admin
        .post(url("/api/admin/players"))
        .json(&json!({"spotify_url": "https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let player: Value = resp.json().await.unwrap();
    assert_eq!(
        player["embed_url"],
        "https://open.spotify.com/embed/album/4aawyAB9vmqN3uQ7FjRGTy"
    );

    let players: Vec<Value> = admin
        .get(url("/api/admin/players"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut ids: Vec<i64> = players.iter().filter_map(|p| p["id"].as_i64()).collect();
    ids.reverse();

    let resp = admin
        .put(url("/api/admin/players/order"))
        .json(&json!({"ids": ids}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = admin
        .put(url("/api/admin/players/order"))
        .json(&json!({"ids": [ids[0]]}))
        .send()
        .await
        .unwrap();
    if ids.len() > 1 {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = admin
        .delete(url(&format!("/api/admin/players/{}", player["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
