//! Process configuration loaded via OrthoConfig.
//!
//! Every value may come from the command line, a configuration file, or an
//! `ALUMNI_*` environment variable. Unset values fall back to the defaults
//! below.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use crate::domain::{Email, UserValidationError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_PASSWORD_HASH_COST: u32 = 12;
const DEFAULT_CACHE_TTL_SECONDS: i64 = 60;
const DEFAULT_VERIFICATION_TTL_HOURS: i64 = 24;
const DEFAULT_PAYMENT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_MAIL_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_MAIL_SENDER: &str = "no-reply@alumni.example";

/// Configuration for the alumni portal server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ALUMNI")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. In-memory storage is used when absent.
    pub database_url: Option<String>,
    /// File holding at least 64 bytes of session key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`.
    pub cookie_secure: Option<bool>,
    /// `Strict`, `Lax`, or `None`.
    pub same_site: Option<String>,
    /// Generate a throwaway session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session_key: bool,
    /// Payment gateway base URL. The fixture gateway is used when absent.
    pub payment_gateway_url: Option<String>,
    /// Shared secret expected in `X-Webhook-Token`.
    pub payment_webhook_token: Option<String>,
    pub payment_timeout_seconds: Option<u64>,
    pub password_hash_cost: Option<u32>,
    /// Lifetime of cached community listings.
    pub cache_ttl_seconds: Option<i64>,
    pub verification_ttl_hours: Option<i64>,
    /// Emails that register with the administrator role. The environment
    /// form is comma-separated.
    #[serde(default, deserialize_with = "one_or_many")]
    pub admin_emails: Option<Vec<String>>,
    /// HTTP mail relay base URL. Verification tokens are only logged when
    /// absent.
    pub mail_relay_url: Option<String>,
    /// Bearer token for the mail relay.
    pub mail_relay_token: Option<String>,
    pub mail_sender: Option<String>,
    pub mail_timeout_seconds: Option<u64>,
    /// Page linked from verification mail; receives `?token=`.
    pub verification_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Comma-separated environment values arrive as lists, single values as
/// plain strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(entry) => vec![entry],
            OneOrMany::Many(entries) => entries,
        }),
    )
}

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid administrator email '{value}': {source}")]
    AdminEmail {
        value: String,
        #[source]
        source: UserValidationError,
    },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: i64 },
}

fn positive(name: &'static str, value: i64) -> Result<i64, SettingsError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(SettingsError::NotPositive { name, value })
    }
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn password_hash_cost(&self) -> u32 {
        self.password_hash_cost.unwrap_or(DEFAULT_PASSWORD_HASH_COST)
    }

    pub fn payment_timeout(&self) -> StdDuration {
        StdDuration::from_secs(
            self.payment_timeout_seconds
                .unwrap_or(DEFAULT_PAYMENT_TIMEOUT_SECONDS),
        )
    }

    pub fn mail_timeout(&self) -> StdDuration {
        StdDuration::from_secs(
            self.mail_timeout_seconds
                .unwrap_or(DEFAULT_MAIL_TIMEOUT_SECONDS),
        )
    }

    pub fn mail_sender(&self) -> &str {
        self.mail_sender.as_deref().unwrap_or(DEFAULT_MAIL_SENDER)
    }

    pub fn cache_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        let seconds = self.cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS);
        Ok(chrono::Duration::seconds(positive("cacheTtlSeconds", seconds)?))
    }

    pub fn verification_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        let hours = self
            .verification_ttl_hours
            .unwrap_or(DEFAULT_VERIFICATION_TTL_HOURS);
        Ok(chrono::Duration::hours(positive("verificationTtlHours", hours)?))
    }

    /// Parsed administrator emails. Blank entries are skipped.
    pub fn admin_emails(&self) -> Result<Vec<Email>, SettingsError> {
        self.admin_emails
            .iter()
            .flatten()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                Email::new(entry).map_err(|source| SettingsError::AdminEmail {
                    value: entry.to_owned(),
                    source,
                })
            })
            .collect()
    }
}
