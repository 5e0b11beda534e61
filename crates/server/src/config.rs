//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPKART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET_KEY` - Token signing secret (min 32 chars)
//! - `STRIPE_SECRET_KEY` - Payment processor API key
//! - `ENDPOINT_SECRET` - Settlement webhook signing secret
//!
//! ## Optional
//! - `SHOPKART_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPKART_PORT` - Listen port (default: 3000)
//! - `AUTH_TOKEN_SOURCES` - Comma-separated token lookup order (default: `cookie,header`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
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

/// Where the auth gate looks for a bearer token, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The `jwt` cookie set at login.
    Cookie,
    /// The `Authorization: Bearer` request header.
    Header,
}

impl std::str::FromStr for TokenSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cookie" => Ok(Self::Cookie),
            "header" => Ok(Self::Header),
            other => Err(format!("unknown token source '{other}'")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Payment processor API key
    pub stripe_secret_key: SecretString,
    /// Settlement webhook signing secret
    pub webhook_endpoint_secret: SecretString,
    /// Ordered token lookup strategies for the auth gate
    pub token_sources: Vec<TokenSource>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail placeholder/length validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOPKART_DATABASE_URL")?;
        let host = get_env_or_default("SHOPKART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPKART_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOPKART_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPKART_PORT".to_string(), e.to_string()))?;

        let jwt_secret = get_validated_secret("JWT_SECRET_KEY")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET_KEY")?;
        let stripe_secret_key = get_validated_secret("STRIPE_SECRET_KEY")?;
        let webhook_endpoint_secret = get_validated_secret("ENDPOINT_SECRET")?;

        let token_sources =
            parse_token_sources(&get_env_or_default("AUTH_TOKEN_SOURCES", "cookie,header"))?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            stripe_secret_key,
            webhook_endpoint_secret,
            token_sources,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse the ordered token source list, e.g. `"cookie,header"`.
fn parse_token_sources(raw: &str) -> Result<Vec<TokenSource>, ConfigError> {
    let sources: Vec<TokenSource> = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|e| ConfigError::InvalidEnvVar("AUTH_TOKEN_SOURCES".to_string(), e))?;
    if sources.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "AUTH_TOKEN_SOURCES".to_string(),
            "must name at least one source".to_string(),
        ));
    }
    Ok(sources)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
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

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_value(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_value(&value, key)?;
    Ok(SecretString::from(value))
}
