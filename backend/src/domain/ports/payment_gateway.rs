//! Port for the third-party payment gateway.
//!
//! The gateway hosts the checkout page. Status is always read back from the
//! gateway rather than trusted from callback payloads.

use async_trait::async_trait;

use crate::domain::{Currency, TransactionStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The gateway could not be reached or timed out.
        Transport { message: String } => "payment gateway request failed: {message}",
        /// The gateway answered with an error status.
        Rejected { status: u16, message: String } =>
            "payment gateway rejected the request ({status}): {message}",
        /// The gateway does not know the reference.
        UnknownReference { reference: String } =>
            "payment gateway has no payment {reference}",
        /// The gateway response could not be decoded.
        Decode { message: String } => "payment gateway response was malformed: {message}",
    }
}

/// Request to open a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Our unique reference for the payment.
    pub reference: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Payment currency.
    pub currency: Currency,
    /// Text shown to the donor.
    pub description: String,
}

/// Hosted checkout created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// URL the donor is sent to.
    pub checkout_url: String,
}

/// Payment status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Pending,
    Accepted,
    Refused,
    Cancelled,
}

impl GatewayPaymentStatus {
    /// Transaction status this gateway status maps to.
    pub fn transaction_status(self) -> TransactionStatus {
        match self {
            Self::Pending => TransactionStatus::Pending,
            Self::Accepted => TransactionStatus::Completed,
            Self::Refused => TransactionStatus::Failed,
            Self::Cancelled => TransactionStatus::Cancelled,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout for a payment.
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    /// Poll the current status of a payment.
    async fn fetch_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, PaymentGatewayError>;
}
