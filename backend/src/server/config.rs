//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use actix_web::cookie::{Key, SameSite};
use backend::domain::{AuthSettings, WebhookSecret};
use backend::inbound::http::session_config::SessionSettings;
use backend::outbound::notifications::MailRelayConfig;
use backend::outbound::persistence::DbPool;
use backend::settings::{AppSettings, SettingsError};
use reqwest::Url;

/// Invalid adapter configuration.
#[derive(Debug, thiserror::Error)]
pub enum AdapterConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("invalid payment gateway URL '{value}': {source}")]
    GatewayUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid {setting} '{value}': {source}")]
    MailUrl {
        setting: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

fn mail_url(setting: &'static str, raw: &str) -> Result<Url, AdapterConfigError> {
    Url::parse(raw).map_err(|source| AdapterConfigError::MailUrl {
        setting,
        value: raw.to_owned(),
        source,
    })
}

/// Settings consumed when wiring outbound adapters.
#[derive(Clone)]
pub struct AdapterSettings {
    pub(crate) payment_gateway: Option<Url>,
    pub(crate) payment_timeout: StdDuration,
    pub(crate) webhook_secret: WebhookSecret,
    pub(crate) password_hash_cost: u32,
    pub(crate) cache_ttl: chrono::Duration,
    pub(crate) auth: AuthSettings,
    /// Relay used for verification mail. Tokens are logged when absent.
    pub(crate) mail_relay: Option<MailRelayConfig>,
    /// Include tokens in the fallback log lines.
    pub(crate) reveal_verification_tokens: bool,
}

impl AdapterSettings {
    /// Resolve adapter settings, applying defaults for unset values.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterConfigError`] for malformed URLs, emails, or
    /// non-positive durations.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, AdapterConfigError> {
        let payment_gateway = settings
            .payment_gateway_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|source| AdapterConfigError::GatewayUrl {
                    value: raw.to_owned(),
                    source,
                })
            })
            .transpose()?;
        let webhook_secret = settings
            .payment_webhook_token
            .as_deref()
            .map_or_else(WebhookSecret::disabled, WebhookSecret::new);

        let verify_url = settings
            .verification_url
            .as_deref()
            .map(|raw| mail_url("verification URL", raw))
            .transpose()?;
        let mail_relay = settings
            .mail_relay_url
            .as_deref()
            .map(|raw| {
                Ok::<_, AdapterConfigError>(MailRelayConfig {
                    base: mail_url("mail relay URL", raw)?,
                    api_token: settings.mail_relay_token.clone(),
                    sender: settings.mail_sender().to_owned(),
                    verify_url: verify_url.clone(),
                    timeout: settings.mail_timeout(),
                })
            })
            .transpose()?;

        Ok(Self {
            payment_gateway,
            payment_timeout: settings.payment_timeout(),
            webhook_secret,
            password_hash_cost: settings.password_hash_cost(),
            cache_ttl: settings.cache_ttl()?,
            auth: AuthSettings {
                verification_ttl: settings.verification_ttl()?,
                admin_emails: settings.admin_emails()?,
            },
            mail_relay,
            reveal_verification_tokens: cfg!(debug_assertions),
        })
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) adapters: AdapterSettings,
}

impl ServerConfig {
    /// Construct a server configuration from validated session settings.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, adapters: AdapterSettings) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            adapters,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without a pool every repository is held in process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
