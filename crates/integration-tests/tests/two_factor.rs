//! Integration tests for two-factor login.
//!
//! One test drives the whole flow so the enrolled admin is never shared
//! between concurrently running tests.
//!
//! Run with: cargo test -p bandsite-integration-tests -- --ignored

use bandsite_integration_tests::{
    admin_password, client, current_totp, from_fresh_ip, login, other_site_host,
    totp_admin_email, url, verify_code,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

const WRONG_CODE: &str = "aaaaa-aaaaa";

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_two_factor_login() {
    let email = totp_admin_email();
    let password = admin_password();

    // Enrol
    let admin = client();
    let (status, body) = login(&admin, &email, &password).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "authenticated", "2FA must start disabled for {email}");

    let setup: Value = admin
        .post(url("/api/auth/2fa/setup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let secret = setup["secret"].as_str().unwrap().to_string();
    let enrol_code = current_totp(&secret);

    let resp = admin
        .post(url("/api/auth/2fa/enable"))
        .json(&json!({"code": enrol_code}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let codes: Vec<String> = body["recovery_codes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes.len(), 10);

    // The code that confirmed enrolment cannot be replayed at login
    let replay = client();
    let (_, body) = login(&replay, &email, &password).await;
    assert_eq!(body["status"], "two_factor_required");
    let (status, _) = verify_code(&replay, &enrol_code).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A pending login cannot be finished on another band's site
    let elsewhere = client();
    login(&elsewhere, &email, &password).await;
    let resp = from_fresh_ip(elsewhere.post(url("/api/auth/2fa/verify")))
        .header("x-forwarded-host", other_site_host())
        .json(&json!({"code": codes[0]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Login expired, please sign in again");

    // The fifth wrong code discards the pending login
    let guesser = client();
    login(&guesser, &email, &password).await;
    for _ in 0..4 {
        let (status, body) = verify_code(&guesser, WRONG_CODE).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid verification code");
    }
    let (_, body) = verify_code(&guesser, WRONG_CODE).await;
    assert_eq!(body["error"], "Too many attempts, please sign in again");
    let (status, body) = verify_code(&guesser, &codes[0]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Login expired, please sign in again");

    // A recovery code completes a login exactly once
    let member = client();
    login(&member, &email, &password).await;
    let (status, body) = verify_code(&member, &codes[0].to_uppercase()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "authenticated");
    let resp = member.get(url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let again = client();
    login(&again, &email, &password).await;
    let (status, _) = verify_code(&again, &codes[0]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unenrol so the next run starts from a password-only admin
    let resp = from_fresh_ip(member.post(url("/api/auth/2fa/disable")))
        .json(&json!({"password": password, "code": codes[1]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
