//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HOSTDECK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AUTH_JWT_SECRET` - HS256 secret shared with the identity provider (min 32 chars, high entropy)
//! - `ENOM_UID` - Registrar reseller account id
//! - `ENOM_TOKEN` - Registrar API token
//! - `STRIPE_SECRET_KEY` - Payment provider secret key
//! - `STRIPE_WEBHOOK_SECRET` - Payment provider webhook signing secret
//!
//! ## Optional
//! - `HOSTDECK_HOST` - Bind address (default: 127.0.0.1)
//! - `HOSTDECK_PORT` - Listen port (default: 8000)
//! - `HOSTDECK_CORS_ORIGINS` - Comma-separated allowed origins
//! - `AUTH_JWT_AUDIENCE` - Expected `aud` claim (default: hostdeck)
//! - `AUTH_JWT_ISSUER` - Expected `iss` claim (default: nextauth)
//! - `AUTH_JWT_LEEWAY_SECS` - Clock skew allowance (default: 30)
//! - `ENOM_BASE_URL` - Registrar API base (default: <https://reseller.enom.com>)
//! - `ENOM_TIMEOUT_SECS` - Registrar request timeout (default: 10)
//! - `STRIPE_CURRENCY` - Store currency (default: usd)
//! - `STRIPE_API_BASE` - Payment provider API base (default: <https://api.stripe.com>)
//! - `STRIPE_TIMEOUT_SECS` - Payment provider request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use hostdeck_core::CurrencyCode;

const MIN_JWT_SECRET_LENGTH: usize = 32;
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

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed by CORS. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    /// Bearer token verification
    pub auth: AuthConfig,
    /// Domain registrar API
    pub registrar: RegistrarConfig,
    /// Payment provider API
    pub payments: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Bearer token (HS256 JWT) verification settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub audience: String,
    pub issuer: String,
    pub leeway: Duration,
}

/// Registrar reseller API settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct RegistrarConfig {
    pub base_url: String,
    pub uid: String,
    pub token: SecretString,
    pub timeout: Duration,
}

impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("base_url", &self.base_url)
            .field("uid", &self.uid)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Payment provider settings.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
    pub currency: CurrencyCode,
    pub api_base: String,
    pub timeout: Duration,
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

        let database_url = get_database_url("HOSTDECK_DATABASE_URL")?;
        let host = parse_env("HOSTDECK_HOST", "127.0.0.1")?;
        let port = parse_env("HOSTDECK_PORT", "8000")?;
        let cors_origins = get_optional_env("HOSTDECK_CORS_ORIGINS")
            .map(|v| split_csv(&v))
            .unwrap_or_default();

        let sentry_sample_rate = parse_env("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            cors_origins,
            auth: AuthConfig::from_env()?,
            registrar: RegistrarConfig::from_env()?,
            payments: PaymentConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = get_validated_secret("AUTH_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "AUTH_JWT_SECRET")?;

        Ok(Self {
            jwt_secret,
            audience: get_env_or_default("AUTH_JWT_AUDIENCE", "hostdeck"),
            issuer: get_env_or_default("AUTH_JWT_ISSUER", "nextauth"),
            leeway: Duration::from_secs(parse_env("AUTH_JWT_LEEWAY_SECS", "30")?),
        })
    }
}

impl RegistrarConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_env_or_default("ENOM_BASE_URL", "https://reseller.enom.com"),
            uid: get_required_env("ENOM_UID")?,
            token: get_required_secret("ENOM_TOKEN")?,
            timeout: Duration::from_secs(parse_env("ENOM_TIMEOUT_SECS", "10")?),
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_currency = get_env_or_default("STRIPE_CURRENCY", "usd");
        let currency = CurrencyCode::parse(&raw_currency).map_err(|e| {
            ConfigError::InvalidEnvVar("STRIPE_CURRENCY".to_string(), e.to_string())
        })?;

        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
            currency,
            api_base: get_env_or_default("STRIPE_API_BASE", "https://api.stripe.com"),
            timeout: Duration::from_secs(parse_env("STRIPE_TIMEOUT_SECS", "15")?),
        })
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

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
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
///
/// Provider key prefixes (`sk_live_`, `whsec_`, ...) are skipped before the
/// checks so that the word "secret" in a prefix is not flagged.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let body = strip_key_prefix(secret);
    let lower = body.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(body);
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

fn strip_key_prefix(secret: &str) -> &str {
    const PREFIXES: &[&str] = &["sk_live_", "sk_test_", "rk_live_", "rk_test_", "whsec_"];
    PREFIXES
        .iter()
        .find_map(|p| secret.strip_prefix(p))
        .unwrap_or(secret)
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
