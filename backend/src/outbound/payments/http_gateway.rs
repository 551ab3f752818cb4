//! Reqwest-backed payment gateway adapter.
//!
//! Owns transport details only: URL construction, timeouts, HTTP status
//! mapping, and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{CheckoutDto, CreatePaymentDto, PaymentStatusDto};
use crate::domain::ports::{
    CheckoutRequest, CheckoutSession, GatewayPaymentStatus, PaymentGateway, PaymentGatewayError,
};

const USER_AGENT: &str = "alumni-backend-payments/0.1";

/// Payment gateway client rooted at one base URL.
pub struct HttpPaymentGateway {
    client: Client,
    base: Url,
}

impl HttpPaymentGateway {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base })
    }

    fn payments_url(&self, reference: Option<&str>) -> Result<Url, PaymentGatewayError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                PaymentGatewayError::transport(format!("gateway URL {} cannot be a base", self.base))
            })?;
            segments.pop_if_empty().push("payments");
            if let Some(reference) = reference {
                segments.push(reference);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let response = self
            .client
            .post(self.payments_url(None)?)
            .json(&CreatePaymentDto::from(request))
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), &request.reference));
        }
        let decoded: CheckoutDto = serde_json::from_slice(&body).map_err(|error| {
            PaymentGatewayError::decode(format!("invalid checkout payload: {error}"))
        })?;
        Ok(CheckoutSession {
            checkout_url: decoded.checkout_url,
        })
    }

    async fn fetch_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, PaymentGatewayError> {
        let response = self
            .client
            .get(self.payments_url(Some(reference))?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), reference));
        }
        parse_status(body.as_ref(), reference)
    }
}

fn parse_status(body: &[u8], reference: &str) -> Result<GatewayPaymentStatus, PaymentGatewayError> {
    let decoded: PaymentStatusDto = serde_json::from_slice(body).map_err(|error| {
        PaymentGatewayError::decode(format!("invalid status payload: {error}"))
    })?;
    if decoded.reference != reference {
        return Err(PaymentGatewayError::decode(format!(
            "status for {} returned while polling {reference}",
            decoded.reference
        )));
    }
    Ok(decoded.status.into())
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    PaymentGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8], reference: &str) -> PaymentGatewayError {
    if status == StatusCode::NOT_FOUND {
        return PaymentGatewayError::unknown_reference(reference);
    }
    let preview: String = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(160)
        .collect();
    PaymentGatewayError::rejected(status.as_u16(), preview)
}
