//! Tenant resolution from the request host.
//!
//! A tenant is served on `{slug}.{platform domain}` (optionally with `www.`)
//! or on its own custom domain. The platform's root domain serves no tenant.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::HOST;
use moka::future::Cache;
use sqlx::PgPool;

use bandsite_core::Slug;

use crate::db::{RepositoryError, TenantRepository};
use crate::models::Tenant;

/// How long resolved hosts (including misses) are cached.
const RESOLUTION_CACHE_TTL: Duration = Duration::from_secs(60);

const FORWARDED_HOST: &str = "x-forwarded-host";

/// What a request host refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostMatch {
    /// `{slug}.{platform domain}`
    Subdomain(String),
    /// A tenant's own domain, without a leading `www.`.
    CustomDomain(String),
    /// The platform's own domain.
    Platform,
    /// `localhost` or an IP literal, mapped to the configured dev tenant.
    DevFallback(String),
    /// Nothing this server serves.
    Unknown,
}

/// The request host: `X-Forwarded-Host` (first value) if present, else `Host`.
#[must_use]
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get(HOST).and_then(|v| v.to_str().ok()))
        .and_then(normalize_host)
}

/// Strip the port and one trailing dot, and lowercase.
///
/// IPv6 literals keep their brackets off: `[::1]:3000` becomes `::1`.
#[must_use]
pub fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        rest.split(']').next().unwrap_or_default()
    } else {
        raw.split(':').next().unwrap_or_default()
    };
    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

fn is_local(host: &str) -> bool {
    host == "localhost" || host.parse::<IpAddr>().is_ok()
}

/// Classify a normalized host.
#[must_use]
pub fn resolve_host(host: &str, platform_domain: &str, dev_tenant: Option<&str>) -> HostMatch {
    if is_local(host) {
        return dev_tenant.map_or(HostMatch::Unknown, |slug| {
            HostMatch::DevFallback(slug.to_string())
        });
    }

    if host == platform_domain || host.strip_prefix("www.") == Some(platform_domain) {
        return HostMatch::Platform;
    }

    if let Some(prefix) = host
        .strip_suffix(platform_domain)
        .and_then(|p| p.strip_suffix('.'))
    {
        let label = prefix.strip_prefix("www.").unwrap_or(prefix);
        return match Slug::parse(label) {
            Ok(slug) if !label.contains('.') => HostMatch::Subdomain(slug.into_inner()),
            _ => HostMatch::Unknown,
        };
    }

    let domain = host.strip_prefix("www.").unwrap_or(host);
    if domain.contains('.') {
        HostMatch::CustomDomain(domain.to_string())
    } else {
        HostMatch::Unknown
    }
}

/// The form a custom domain is stored in, so [`resolve_host`] finds it.
///
/// Returns `None` for hosts that would never resolve as a custom domain:
/// the platform domain and anything under it, local hosts, bare labels.
#[must_use]
pub fn custom_domain_key(raw: &str, platform_domain: &str) -> Option<String> {
    let host = normalize_host(raw)?;
    match resolve_host(&host, platform_domain, None) {
        HostMatch::CustomDomain(domain) => Some(domain),
        _ => None,
    }
}

/// Public URL of a tenant's site.
#[must_use]
pub fn site_url(tenant: &Tenant, platform_domain: &str, secure: bool) -> String {
    let scheme = if secure { "https" } else { "http" };
    match &tenant.custom_domain {
        Some(domain) => format!("{scheme}://{domain}"),
        None => format!("{scheme}://{}.{platform_domain}", tenant.slug),
    }
}

/// Maps request hosts to active tenants, with a short-lived cache.
#[derive(Clone)]
pub struct TenantResolver {
    pool: PgPool,
    platform_domain: String,
    dev_tenant: Option<String>,
    cache: Cache<HostMatch, Option<Arc<Tenant>>>,
}

impl TenantResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(pool: PgPool, platform_domain: String, dev_tenant: Option<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(RESOLUTION_CACHE_TTL)
            .build();

        Self {
            pool,
            platform_domain,
            dev_tenant,
            cache,
        }
    }

    /// Classify a normalized host with this resolver's settings.
    #[must_use]
    pub fn classify(&self, host: &str) -> HostMatch {
        resolve_host(host, &self.platform_domain, self.dev_tenant.as_deref())
    }

    /// The active tenant served on `host`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails. Failures are not cached.
    pub async fn resolve(&self, host: &str) -> Result<Option<Arc<Tenant>>, RepositoryError> {
        let key = self.classify(host);
        if matches!(key, HostMatch::Platform | HostMatch::Unknown) {
            return Ok(None);
        }

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let repo = TenantRepository::new(&self.pool);
        let tenant = match &key {
            HostMatch::Subdomain(slug) | HostMatch::DevFallback(slug) => {
                repo.get_by_slug(slug).await?
            }
            HostMatch::CustomDomain(domain) => repo.get_by_domain(domain).await?,
            HostMatch::Platform | HostMatch::Unknown => None,
        };
        let tenant = tenant.filter(|t| t.active).map(Arc::new);

        tracing::debug!(host = %host, found = tenant.is_some(), "Resolved tenant");
        self.cache.insert(key, tenant.clone()).await;
        Ok(tenant)
    }

    /// Forget every cached resolution.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const DOMAIN: &str = "bandsite.app";

    fn resolve(host: &str) -> HostMatch {
        resolve_host(&normalize_host(host).unwrap(), DOMAIN, None)
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Owls.Bandsite.App:443").as_deref(), Some("owls.bandsite.app"));
        assert_eq!(normalize_host("owls.band.").as_deref(), Some("owls.band"));
        assert_eq!(normalize_host("[::1]:3000").as_deref(), Some("::1"));
        assert_eq!(normalize_host(":80"), None);
    }

    #[test]
    fn test_forwarded_host_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("internal:3000"));
        assert_eq!(request_host(&headers).as_deref(), Some("internal"));

        headers.insert(
            FORWARDED_HOST,
            HeaderValue::from_static("Owls.Band, proxy.internal"),
        );
        assert_eq!(request_host(&headers).as_deref(), Some("owls.band"));
    }

    #[test]
    fn test_subdomains() {
        assert_eq!(resolve("owls.bandsite.app"), HostMatch::Subdomain("owls".to_string()));
        assert_eq!(
            resolve("www.owls.bandsite.app"),
            HostMatch::Subdomain("owls".to_string())
        );
        assert_eq!(resolve("admin.bandsite.app"), HostMatch::Unknown);
        assert_eq!(resolve("a.b.bandsite.app"), HostMatch::Unknown);
        assert_eq!(resolve("Bad_Label.bandsite.app"), HostMatch::Unknown);
    }

    #[test]
    fn test_platform_domain() {
        assert_eq!(resolve("bandsite.app"), HostMatch::Platform);
        assert_eq!(resolve("www.bandsite.app"), HostMatch::Platform);
    }

    #[test]
    fn test_custom_domains() {
        assert_eq!(
            resolve("www.midnightowls.com"),
            HostMatch::CustomDomain("midnightowls.com".to_string())
        );
        assert_eq!(
            resolve("midnightowls.com"),
            HostMatch::CustomDomain("midnightowls.com".to_string())
        );
        // Not a subdomain of the platform, despite the suffix
        assert_eq!(
            resolve("evilbandsite.app"),
            HostMatch::CustomDomain("evilbandsite.app".to_string())
        );
        assert_eq!(resolve("intranet"), HostMatch::Unknown);
    }

    #[test]
    fn test_custom_domain_stored_as_resolved() {
        for typed in ["www.midnightowls.com", "MidnightOwls.com.", "midnightowls.com:443"] {
            let stored = custom_domain_key(typed, DOMAIN).unwrap();
            assert_eq!(stored, "midnightowls.com");
            assert_eq!(resolve(typed), HostMatch::CustomDomain(stored));
        }
        assert_eq!(
            custom_domain_key("shop.midnightowls.com", DOMAIN).as_deref(),
            Some("shop.midnightowls.com")
        );
    }

    #[test]
    fn test_custom_domain_rejects_platform_hosts() {
        assert_eq!(custom_domain_key("bandsite.app", DOMAIN), None);
        assert_eq!(custom_domain_key("www.bandsite.app", DOMAIN), None);
        assert_eq!(custom_domain_key("owls.bandsite.app", DOMAIN), None);
        assert_eq!(custom_domain_key("a.b.bandsite.app", DOMAIN), None);
        assert_eq!(custom_domain_key("localhost", DOMAIN), None);
        assert_eq!(custom_domain_key("intranet", DOMAIN), None);
    }

    #[test]
    fn test_local_hosts() {
        assert_eq!(resolve("localhost:3000"), HostMatch::Unknown);
        assert_eq!(
            resolve_host("127.0.0.1", DOMAIN, Some("owls")),
            HostMatch::DevFallback("owls".to_string())
        );
        assert_eq!(
            resolve_host("::1", DOMAIN, Some("owls")),
            HostMatch::DevFallback("owls".to_string())
        );
    }

    #[test]
    fn test_site_url() {
        let now = chrono::Utc::now();
        let mut tenant = Tenant {
            id: bandsite_core::TenantId::new(1),
            slug: Slug::parse("owls").unwrap(),
            name: "Midnight Owls".to_string(),
            custom_domain: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(site_url(&tenant, DOMAIN, true), "https://owls.bandsite.app");

        tenant.custom_domain = Some("midnightowls.com".to_string());
        assert_eq!(site_url(&tenant, DOMAIN, false), "http://midnightowls.com");
    }
}
