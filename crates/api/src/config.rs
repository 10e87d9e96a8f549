//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SUPABASE_URL` - Project URL of the hosted auth service
//! - `SUPABASE_ANON_KEY` - Public API key sent as `apikey` to the auth service
//! - `AUTOMATION_TOKEN` - Shared bearer token for workflow-automation endpoints
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 0.0.0.0)
//! - `API_PORT` - Listen port (default: 8080)
//! - `SPOKE_WEBHOOK_TOKEN` - Shared bearer token expected on courier webhooks
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (Mercado Pago - enables the payment webhook)
//! - `MERCADOPAGO_ACCESS_TOKEN` - Private access token
//! - `MERCADOPAGO_API_URL` - API base URL (default: <https://api.mercadopago.com>)
//!
//! ## Optional (TLS)
//! - `API_TLS_CERT` - PEM-encoded certificate chain
//! - `API_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MERCADOPAGO_API_URL: &str = "https://api.mercadopago.com";

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

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Hosted auth service used to resolve bearer tokens to users
    pub supabase: SupabaseConfig,
    /// Bearer token expected on workflow-automation endpoints
    pub automation_token: SecretString,
    /// Bearer token expected on courier webhooks (open when unset)
    pub spoke_webhook_token: Option<SecretString>,
    /// Mercado Pago configuration (optional - enables the payment webhook)
    pub mercadopago: Option<MercadoPagoConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Hosted auth service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g., <https://abc.supabase.co>)
    pub url: Url,
    /// Anonymous API key
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Mercado Pago API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    /// API base URL
    pub api_url: Url,
    /// Private access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for MercadoPagoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoConfig")
            .field("api_url", &self.api_url.as_str())
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("API_TLS_CERT");
        let key_pem = get_optional_env("API_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "API_TLS_*".to_string(),
                "Both API_TLS_CERT and API_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ApiConfig {
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

        let database_url = get_database_url("API_DATABASE_URL")?;
        let host = get_env_or_default("API_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_PORT".to_string(), e.to_string()))?;

        let supabase = SupabaseConfig::from_env()?;
        let automation_token = get_validated_secret("AUTOMATION_TOKEN")?;
        let spoke_webhook_token = get_optional_env("SPOKE_WEBHOOK_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "SPOKE_WEBHOOK_TOKEN") {
                tracing::warn!("SPOKE_WEBHOOK_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });
        let mercadopago = MercadoPagoConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            supabase,
            automation_token,
            spoke_webhook_token,
            mercadopago,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Mercado Pago configuration (if configured).
    #[must_use]
    pub const fn mercadopago(&self) -> Option<&MercadoPagoConfig> {
        self.mercadopago.as_ref()
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_url("SUPABASE_URL", None)?,
            anon_key: get_required_secret("SUPABASE_ANON_KEY")?,
        })
    }
}

impl MercadoPagoConfig {
    /// Load Mercado Pago configuration from environment.
    ///
    /// Returns `None` if `MERCADOPAGO_ACCESS_TOKEN` is not set (payment webhook disabled).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(access_token) = get_optional_env("MERCADOPAGO_ACCESS_TOKEN") else {
            return Ok(None);
        };

        if let Err(e) = validate_secret_strength(&access_token, "MERCADOPAGO_ACCESS_TOKEN") {
            tracing::warn!("MERCADOPAGO_ACCESS_TOKEN validation warning: {e}");
        }

        Ok(Some(Self {
            api_url: get_url("MERCADOPAGO_API_URL", Some(DEFAULT_MERCADOPAGO_API_URL))?,
            access_token: SecretString::from(access_token),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable as an absolute `http(s)` URL.
fn get_url(key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
    let raw = match (get_optional_env(key), default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.to_string(),
        (None, None) => return Err(ConfigError::MissingEnvVar(key.to_string())),
    };
    parse_http_url(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Parse an absolute `http` or `https` URL.
fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
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
            #[allow(clippy::cast_precision_loss)]
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

/// Compare a presented bearer token against the configured secret.
///
/// Runs in time independent of the position of the first mismatching byte.
#[must_use]
pub fn token_matches(expected: &SecretString, presented: &str) -> bool {
    let expected = expected.expose_secret().as_bytes();
    let presented = presented.as_bytes();
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-automation-token", "AUTOMATION_TOKEN");
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
    fn test_parse_http_url() {
        assert!(parse_http_url("https://abc.supabase.co").is_ok());
        assert!(parse_http_url("http://localhost:54321").is_ok());
        assert!(parse_http_url("ftp://example.org").is_err());
        assert!(parse_http_url("not a url").is_err());
    }

    #[test]
    fn test_token_matches() {
        let expected = SecretString::from("n8n-Tk9$wQ2!");
        assert!(token_matches(&expected, "n8n-Tk9$wQ2!"));
        assert!(!token_matches(&expected, "n8n-Tk9$wQ2?"));
        assert!(!token_matches(&expected, "n8n"));
        assert!(!token_matches(&expected, ""));
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            supabase: SupabaseConfig {
                url: Url::parse("http://localhost:54321").unwrap(),
                anon_key: SecretString::from("anon"),
            },
            automation_token: SecretString::from("token"),
            spoke_webhook_token: None,
            mercadopago: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_supabase_config_debug_redacts_secrets() {
        let config = SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("super_anon_key_value"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("abc.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_anon_key_value"));
    }

    #[test]
    fn test_mercadopago_config_debug_redacts_secrets() {
        let config = MercadoPagoConfig {
            api_url: Url::parse(DEFAULT_MERCADOPAGO_API_URL).unwrap(),
            access_token: SecretString::from("APP_USR-super-secret"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.mercadopago.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("APP_USR-super-secret"));
    }
}
