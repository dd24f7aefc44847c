//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The CSP is locked
//! down except for the third-party embeds a band site shows: Spotify and
//! YouTube players, the Bandsintown widget, Stripe buy buttons and Shopify
//! product images.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Content Security Policy for every response.
///
/// Tenant logos and hero images are arbitrary https URLs, hence `img-src https:`.
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'none'; \
     script-src 'self' https://widget.bandsintown.com https://js.stripe.com; \
     style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
     font-src 'self' https://fonts.gstatic.com; \
     img-src 'self' data: https:; \
     connect-src 'self' https://rest.bandsintown.com https://api.stripe.com; \
     frame-src https://open.spotify.com https://www.youtube-nocookie.com \
     https://js.stripe.com https://buy.stripe.com https://widget.bandsintown.com; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'; \
     upgrade-insecure-requests";

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin` - Embeds need an origin
/// - `Content-Security-Policy` - See [`CONTENT_SECURITY_POLICY_VALUE`]
/// - `Permissions-Policy` - Only what the players and Stripe use
/// - `Cache-Control: no-store, max-age=0` - Unless the handler set one
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - Stripe checkout opens a popup
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
    );

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(self \"https://open.spotify.com\" \"https://www.youtube-nocookie.com\"), \
             camera=(), \
             clipboard-write=(self \"https://open.spotify.com\"), \
             display-capture=(), \
             encrypted-media=(self \"https://open.spotify.com\" \"https://www.youtube-nocookie.com\"), \
             fullscreen=(self \"https://open.spotify.com\" \"https://www.youtube-nocookie.com\"), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://js.stripe.com\" \"https://buy.stripe.com\"), \
             picture-in-picture=(self \"https://www.youtube-nocookie.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, response::IntoResponse, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn get_path(path: &str) -> Response {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/theme.css",
                get(|| async { ([(CACHE_CONTROL, "public, max-age=300")], "").into_response() }),
            )
            .layer(axum::middleware::from_fn(security_headers_middleware))
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_headers_applied() {
        let response = get_path("/").await;
        let headers = response.headers();
        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[CACHE_CONTROL], "no-store, max-age=0");

        let csp = headers[CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.contains("frame-src https://open.spotify.com https://www.youtube-nocookie.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[tokio::test]
    async fn test_handler_cache_control_kept() {
        let response = get_path("/theme.css").await;
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=300");
    }
}
