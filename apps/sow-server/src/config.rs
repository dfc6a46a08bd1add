//! Server configuration, read from the environment at startup.
//!
//! ```bash
//! # Public origin used to build signing links
//! SOW_APP_URL=https://sow.example.com
//! SOW_TOKEN_TTL_DAYS=7
//!
//! # Branding and provider copy of executed documents
//! SOW_PROVIDER_NAME=ARCODIC
//! SOW_PROVIDER_EMAIL=team@example.com
//!
//! # Provider: Resend
//! SOW_EMAIL_PROVIDER=resend
//! RESEND_API_KEY=re_...
//!
//! # Provider: SMTP
//! SOW_EMAIL_PROVIDER=smtp
//! SMTP_HOST=smtp.gmail.com
//! SMTP_PORT=587
//! SMTP_USERNAME=user@example.com
//! SMTP_PASSWORD=app_password
//! SMTP_USE_TLS=true
//!
//! # Sender config
//! SOW_EMAIL_FROM=sow@example.com
//! SOW_EMAIL_FROM_NAME="ARCODIC"
//! ```

use chrono::Duration;
use std::env;
use thiserror::Error;

pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
pub const DEFAULT_PROVIDER_NAME: &str = "ARCODIC";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Origin signing links are built on, without a trailing slash
    pub app_base_url: String,
    pub token_ttl: Duration,
    pub provider_name: String,
    /// Receives the provider copy of executed documents
    pub provider_email: Option<String>,
    pub email: Option<EmailConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_base_url: DEFAULT_APP_URL.to_string(),
            token_ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_email: None,
            email: None,
        }
    }
}

/// Outbound email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProviderConfig,
    pub from_address: String,
    pub from_name: Option<String>,
}

/// Email provider configuration
#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Resend {
        #[allow(dead_code)] // Used when email-resend feature is enabled
        api_key: String,
    },
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid email provider: {0}. Expected 'resend' or 'smtp'")]
    InvalidProvider(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Missing from address: SOW_EMAIL_FROM is required when email is configured")]
    MissingFromAddress,

    #[error("SMTP provider requires SMTP_HOST")]
    SmtpMissingHost,

    #[error("Invalid SOW_APP_URL {0}: {1}")]
    InvalidAppUrl(String, String),

    #[error("Invalid SOW_TOKEN_TTL_DAYS: {0}. Expected a positive number of days")]
    InvalidTokenTtl(String),
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_base_url = normalize_base_url(
            &env::var("SOW_APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.to_string()),
        )?;

        let token_ttl = match env::var("SOW_TOKEN_TTL_DAYS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(days) if days > 0 => Duration::days(days),
                _ => return Err(ConfigError::InvalidTokenTtl(raw)),
            },
            Err(_) => Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        };

        let provider_name =
            env::var("SOW_PROVIDER_NAME").unwrap_or_else(|_| DEFAULT_PROVIDER_NAME.to_string());
        let provider_email = env::var("SOW_PROVIDER_EMAIL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            app_base_url,
            token_ttl,
            provider_name,
            provider_email,
            email: EmailConfig::from_env()?,
        })
    }

    /// `{app_base_url}/sign/{token}`
    pub fn signing_url(&self, token: &str) -> String {
        format!("{}/sign/{}", self.app_base_url, token)
    }
}

impl EmailConfig {
    /// `Ok(None)` when no provider is selected; emails are then skipped.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(provider_type) = env::var("SOW_EMAIL_PROVIDER").ok() else {
            return Ok(None);
        };

        let provider = match provider_type.to_lowercase().as_str() {
            "resend" => {
                let api_key = env::var("RESEND_API_KEY")
                    .map_err(|_| ConfigError::MissingEnvVar("RESEND_API_KEY".to_string()))?;
                EmailProviderConfig::Resend { api_key }
            }
            "smtp" => {
                let host = env::var("SMTP_HOST").map_err(|_| ConfigError::SmtpMissingHost)?;
                let raw_port = env::var("SMTP_PORT").unwrap_or_else(|_| "587".to_string());
                let port = raw_port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw_port.clone()))?;
                let username = env::var("SMTP_USERNAME").ok();
                let password = env::var("SMTP_PASSWORD").ok();
                let use_tls = env::var("SMTP_USE_TLS")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(true);

                EmailProviderConfig::Smtp {
                    host,
                    port,
                    username,
                    password,
                    use_tls,
                }
            }
            other => return Err(ConfigError::InvalidProvider(other.to_string())),
        };

        let from_address =
            env::var("SOW_EMAIL_FROM").map_err(|_| ConfigError::MissingFromAddress)?;
        let from_name = env::var("SOW_EMAIL_FROM_NAME").ok();

        Ok(Some(Self {
            provider,
            from_address,
            from_name,
        }))
    }

    /// `Name <address>` when a display name is configured.
    pub fn from_header(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_address),
            None => self.from_address.clone(),
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidAppUrl(raw.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidAppUrl(
            raw.to_string(),
            "scheme must be http or https".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
