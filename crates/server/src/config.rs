//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BANDSITE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BANDSITE_BASE_URL` - Public URL of the platform (e.g., `https://bandsite.app`)
//! - `BANDSITE_PLATFORM_DOMAIN` - Domain under which tenant subdomains live (e.g., `bandsite.app`)
//! - `BANDSITE_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BANDSITE_HOST` - Bind address (default: 127.0.0.1)
//! - `BANDSITE_PORT` - Listen port (default: 3000)
//! - `BANDSITE_DEV_TENANT` - Tenant slug served on `localhost` during development
//! - `SHOPIFY_API_VERSION` - Storefront API version (default: 2026-01)
//! - `SES_REGION` - AWS region of the SES SMTP endpoint (enables email)
//! - `SES_SMTP_USERNAME` / `SES_SMTP_PASSWORD` - SES SMTP credentials
//! - `SES_FROM_ADDRESS` - Sender address (default: `no-reply@{platform domain}`)
//! - `SES_WEBHOOK_TOKEN` - Shared secret expected on `/webhooks/ses?token=`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the platform
    pub base_url: String,
    /// Domain tenant subdomains hang off (`{slug}.{platform_domain}`)
    pub platform_domain: String,
    /// Tenant served for `localhost` / IP hosts (development only)
    pub dev_tenant: Option<String>,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Shopify Storefront API settings shared by all tenants
    pub shopify: ShopifyConfig,
    /// AWS SES settings (email is disabled when `None`)
    pub ses: Option<SesConfig>,
    /// Shared secret for the SES notification webhook
    pub ses_webhook_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Platform-wide Shopify settings.
///
/// Store domains and access tokens are per tenant and live in the database.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Storefront API version (e.g., 2026-01)
    pub api_version: String,
}

/// AWS SES SMTP configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct SesConfig {
    /// AWS region (e.g., us-east-1)
    pub region: String,
    /// SMTP username (an IAM SMTP credential, not an access key)
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// From address for outgoing mail
    pub from_address: String,
}

impl SesConfig {
    /// SES SMTP endpoint for the configured region.
    #[must_use]
    pub fn smtp_host(&self) -> String {
        format!("email-smtp.{}.amazonaws.com", self.region)
    }
}

impl std::fmt::Debug for SesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesConfig")
            .field("region", &self.region)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BANDSITE_DATABASE_URL")?;
        let host = get_env_or_default("BANDSITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BANDSITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BANDSITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BANDSITE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BANDSITE_BASE_URL")?;
        let platform_domain = normalize_domain(&get_required_env("BANDSITE_PLATFORM_DOMAIN")?);
        if platform_domain.is_empty() || !platform_domain.contains('.') {
            return Err(ConfigError::InvalidEnvVar(
                "BANDSITE_PLATFORM_DOMAIN".to_string(),
                "must be a domain name such as bandsite.app".to_string(),
            ));
        }
        let dev_tenant = get_optional_env("BANDSITE_DEV_TENANT");

        let session_secret = get_validated_secret("BANDSITE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "BANDSITE_SESSION_SECRET")?;

        let shopify = ShopifyConfig {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
        };
        let ses = SesConfig::from_env(&platform_domain)?;
        let ses_webhook_token = match get_optional_env("SES_WEBHOOK_TOKEN") {
            Some(value) => {
                validate_secret_strength(&value, "SES_WEBHOOK_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            platform_domain,
            dev_tenant,
            session_secret,
            shopify,
            ses,
            ses_webhook_token,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SesConfig {
    /// SES is optional; it is enabled by setting `SES_REGION`.
    fn from_env(platform_domain: &str) -> Result<Option<Self>, ConfigError> {
        let Some(region) = get_optional_env("SES_REGION") else {
            return Ok(None);
        };

        Ok(Some(Self {
            region,
            smtp_username: get_required_env("SES_SMTP_USERNAME")?,
            smtp_password: get_required_secret("SES_SMTP_PASSWORD")?,
            from_address: get_optional_env("SES_FROM_ADDRESS")
                .unwrap_or_else(|| format!("no-reply@{platform_domain}")),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Lowercase a domain and strip any trailing dot.
fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
impl ServerConfig {
    /// Configuration for router tests: no SES, no Sentry, lazy database.
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/bandsite_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            platform_domain: "bandsite.app".to_string(),
            dev_tenant: Some("dev-band".to_string()),
            session_secret: SecretString::from("x".repeat(32)),
            shopify: ShopifyConfig {
                api_version: "2026-01".to_string(),
            },
            ses: None,
            ses_webhook_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig::for_tests()
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" BandSite.App. "), "bandsite.app");
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_ses_config_debug_redacts_password() {
        let ses = SesConfig {
            region: "us-east-1".to_string(),
            smtp_username: "AKIAEXAMPLEUSER".to_string(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
            from_address: "no-reply@bandsite.app".to_string(),
        };

        let debug_output = format!("{ses:?}");
        assert!(debug_output.contains("us-east-1"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
        assert_eq!(ses.smtp_host(), "email-smtp.us-east-1.amazonaws.com");
    }
}
