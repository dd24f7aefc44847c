//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: login, 2FA and password endpoints (~10/min per IP)
//! - `newsletter_rate_limiter`: public newsletter signups (~10/min per IP)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, Request, request::Parts};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP extraction
// =============================================================================

/// Real client IP from proxy headers: `CF-Connecting-IP`, then the first
/// `X-Forwarded-For` entry, then `X-Real-IP`, then `Fly-Client-IP`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("cf-connecting-ip")
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| header("x-real-ip").and_then(|s| s.trim().parse().ok()))
        .or_else(|| header("fly-client-ip").and_then(|s| s.trim().parse().ok()))
}

/// Key extractor that rate limits by [`client_ip`], falling back to the
/// peer address when no proxy header is present.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Client IP for handlers: proxy headers first, then the peer address.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })))
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for newsletter signups: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 10.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(10)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn newsletter_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("fly-client-ip", HeaderValue::from_static("10.0.0.4"));
        assert_eq!(client_ip(&headers), "10.0.0.4".parse().ok());

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7".parse().ok());

        headers.insert("cf-connecting-ip", HeaderValue::from_static("2001:db8::1"));
        assert_eq!(client_ip(&headers), "2001:db8::1".parse().ok());
    }

    #[test]
    fn test_garbage_header_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("unknown"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2".parse().ok());
    }

    #[test]
    fn test_key_falls_back_to_peer_address() {
        let mut request = Request::builder().body(()).unwrap();
        assert!(ProxyIpKeyExtractor.extract(&request).is_err());

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 40_000))));
        assert_eq!(
            ProxyIpKeyExtractor.extract(&request).ok(),
            Some(IpAddr::from([192, 0, 2, 9]))
        );
    }
}
