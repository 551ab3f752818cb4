//! Reqwest-backed verification mail delivered through an HTTP mail relay.
//!
//! The relay accepts `POST {base}/messages` with a JSON body of sender,
//! recipient, subject, and plain-text content. Any 2xx response counts as
//! accepted for delivery.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::info;

use crate::domain::Email;
use crate::domain::ports::{VerificationNotifier, VerificationNotifierError};

const USER_AGENT: &str = "alumni-backend-mail/0.1";
const SUBJECT: &str = "Confirm your alumni portal email";

/// Relay endpoint and message settings.
#[derive(Clone)]
pub struct MailRelayConfig {
    pub base: Url,
    /// Sent as a bearer token when present.
    pub api_token: Option<String>,
    pub sender: String,
    /// Page that accepts `?token=`. Messages carry the bare token otherwise.
    pub verify_url: Option<Url>,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct MailMessageDto<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Verification notifier that hands messages to an HTTP mail relay.
pub struct HttpVerificationNotifier {
    client: Client,
    config: MailRelayConfig,
}

impl HttpVerificationNotifier {
    /// Build a relay client using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: MailRelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> Result<Url, VerificationNotifierError> {
        let mut url = self.config.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                VerificationNotifierError::delivery(format!(
                    "mail relay URL {} cannot be a base",
                    self.config.base
                ))
            })?
            .pop_if_empty()
            .push("messages");
        Ok(url)
    }

    fn message_text(&self, token: &str, expires_at: DateTime<Utc>) -> String {
        let action = match &self.config.verify_url {
            Some(page) => {
                let mut link = page.clone();
                link.query_pairs_mut().append_pair("token", token);
                format!("Open this link to confirm your address:\n\n{link}")
            }
            None => format!("Use this code to confirm your address:\n\n{token}"),
        };
        format!(
            "{action}\n\nIt expires at {} (UTC).",
            expires_at.format("%Y-%m-%d %H:%M")
        )
    }
}

#[async_trait]
impl VerificationNotifier for HttpVerificationNotifier {
    async fn send_verification(
        &self,
        email: &Email,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), VerificationNotifierError> {
        let message = MailMessageDto {
            from: &self.config.sender,
            to: email.as_ref(),
            subject: SUBJECT,
            text: self.message_text(token, expires_at),
        };
        let mut request = self.client.post(self.messages_url()?).json(&message);
        if let Some(api_token) = &self.config.api_token {
            request = request.bearer_auth(api_token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| VerificationNotifierError::delivery(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VerificationNotifierError::delivery(format!(
                "mail relay answered {}",
                status.as_u16()
            )));
        }
        info!(email = %email.as_ref(), "verification mail accepted by relay");
        Ok(())
    }
}
