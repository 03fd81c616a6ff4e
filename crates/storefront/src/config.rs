//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WINNIECHO_DATABASE_URL` - `PostgreSQL` connection string
//! - `WINNIECHO_BASE_URL` - Public URL for the storefront
//! - `WINNIECHO_SESSION_SECRET` - Session signing secret (min 32 chars)
//! - `CARD_GATEWAY_SECRET_KEY` - Card gateway API secret key
//! - `CARD_GATEWAY_WEBHOOK_SECRET` - Card gateway webhook signing secret
//! - `WALLET_GATEWAY_CLIENT_ID` - Wallet gateway OAuth client ID
//! - `WALLET_GATEWAY_CLIENT_SECRET` - Wallet gateway OAuth client secret
//!
//! ## Optional
//! - `WINNIECHO_HOST` - Bind address (default: 127.0.0.1)
//! - `WINNIECHO_PORT` - Listen port (default: 3000)
//! - `WINNIECHO_MEDIA_DIR` - Delivery proof upload directory (default: media)
//! - `CARD_GATEWAY_API_BASE` - Card gateway API base URL
//! - `WALLET_GATEWAY_API_BASE` - Wallet gateway API base URL
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
//!   `SMTP_FROM_ADDRESS`, `ADMIN_NOTIFY_ADDRESS` - Email notifications
//!   (notifier is disabled when `SMTP_HOST` is unset)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory for delivery proof uploads
    pub media_dir: String,
    /// Card gateway (hosted checkout) configuration
    pub card_gateway: CardGatewayConfig,
    /// Wallet gateway (approval redirect) configuration
    pub wallet_gateway: WalletGatewayConfig,
    /// Email notification configuration; `None` disables the notifier
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Card gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CardGatewayConfig {
    /// API base URL
    pub api_base: String,
    /// API secret key (server-side only)
    pub secret_key: SecretString,
    /// Webhook signing secret
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for CardGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardGatewayConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// Wallet gateway configuration.
#[derive(Clone)]
pub struct WalletGatewayConfig {
    /// API base URL
    pub api_base: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for WalletGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletGatewayConfig")
            .field("api_base", &self.api_base)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// SMTP email notification configuration.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// From address for outgoing mail
    pub from_address: String,
    /// Address receiving admin "new order" notifications
    pub admin_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("admin_address", &self.admin_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if secrets fail placeholder/length validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_env("WINNIECHO_DATABASE_URL")?);
        let host = get_env_or_default("WINNIECHO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("WINNIECHO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("WINNIECHO_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("WINNIECHO_PORT".to_string(), e.to_string()))?;
        let base_url = get_env("WINNIECHO_BASE_URL")?;
        let session_secret = get_validated_secret("WINNIECHO_SESSION_SECRET")?;
        let media_dir = get_env_or_default("WINNIECHO_MEDIA_DIR", "media");

        let card_gateway = CardGatewayConfig {
            api_base: get_env_or_default("CARD_GATEWAY_API_BASE", "https://api.stripe.com/v1"),
            secret_key: SecretString::from(get_env("CARD_GATEWAY_SECRET_KEY")?),
            webhook_secret: SecretString::from(get_env("CARD_GATEWAY_WEBHOOK_SECRET")?),
        };

        let wallet_gateway = WalletGatewayConfig {
            api_base: get_env_or_default(
                "WALLET_GATEWAY_API_BASE",
                "https://api.sandbox.paypal.com",
            ),
            client_id: get_env("WALLET_GATEWAY_CLIENT_ID")?,
            client_secret: SecretString::from(get_env("WALLET_GATEWAY_CLIENT_SECRET")?),
        };

        let email = load_email_config()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            media_dir,
            card_gateway,
            wallet_gateway,
            email,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Load email configuration if SMTP is configured.
fn load_email_config() -> Result<Option<EmailConfig>, ConfigError> {
    let Ok(smtp_host) = std::env::var("SMTP_HOST") else {
        return Ok(None);
    };

    let smtp_port = get_env_or_default("SMTP_PORT", "587")
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

    Ok(Some(EmailConfig {
        smtp_host,
        smtp_port,
        smtp_username: get_env("SMTP_USERNAME")?,
        smtp_password: SecretString::from(get_env("SMTP_PASSWORD")?),
        from_address: get_env("SMTP_FROM_ADDRESS")?,
        admin_address: get_env("ADMIN_NOTIFY_ADDRESS")?,
    }))
}

/// Get a required environment variable.
fn get_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Get a secret environment variable, validating it against placeholder
/// patterns and a minimum length.
fn get_validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = get_env(name)?;
    validate_secret(name, &value)?;
    Ok(SecretString::from(value))
}

/// Reject short or obviously-placeholder secrets.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_string(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("contains placeholder pattern '{pattern}'"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_secrets() {
        let result = validate_secret("TEST", "short");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn rejects_placeholder_secrets() {
        let result = validate_secret("TEST", "your-session-secret-goes-here-okay");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn accepts_long_random_secrets() {
        let result = validate_secret("TEST", "k9J2mQ8xR4vL7nP3wT6yB1dF5hG0sA9c");
        assert!(result.is_ok());
    }

    #[test]
    fn debug_redacts_gateway_secrets() {
        let config = CardGatewayConfig {
            api_base: "https://api.test".to_string(),
            secret_key: SecretString::from("sk_live_123"),
            webhook_secret: SecretString::from("whsec_123"),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk_live_123"));
    }
}
