//! Local stand-in for the payment gateway.
//!
//! Every checkout is recorded as pending. Tests and demos settle payments
//! with [`FixturePaymentGateway::set_status`] before triggering the webhook.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    CheckoutRequest, CheckoutSession, GatewayPaymentStatus, PaymentGateway, PaymentGatewayError,
};

const CHECKOUT_BASE: &str = "https://payments.invalid/checkout";

/// In-process gateway keeping payment statuses by reference.
#[derive(Debug, Default)]
pub struct FixturePaymentGateway {
    payments: Mutex<HashMap<String, GatewayPaymentStatus>>,
}

impl FixturePaymentGateway {
    /// Gateway with no payments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status reported for `reference`.
    pub fn set_status(&self, reference: &str, status: GatewayPaymentStatus) {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.to_owned(), status);
    }
}

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        self.set_status(&request.reference, GatewayPaymentStatus::Pending);
        Ok(CheckoutSession {
            checkout_url: format!("{CHECKOUT_BASE}/{}", request.reference),
        })
    }

    async fn fetch_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, PaymentGatewayError> {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .copied()
            .ok_or_else(|| PaymentGatewayError::unknown_reference(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn checkouts_start_pending_and_follow_overrides() {
        let gateway = FixturePaymentGateway::new();
        let session = gateway
            .create_checkout(&CheckoutRequest {
                reference: "don_1".to_owned(),
                amount: 1_000,
                currency: Currency::new("EUR").expect("currency"),
                description: "Library".to_owned(),
            })
            .await
            .expect("checkout");
        assert!(session.checkout_url.ends_with("/don_1"));
        assert_eq!(
            gateway.fetch_status("don_1").await,
            Ok(GatewayPaymentStatus::Pending)
        );

        gateway.set_status("don_1", GatewayPaymentStatus::Accepted);
        assert_eq!(
            gateway.fetch_status("don_1").await,
            Ok(GatewayPaymentStatus::Accepted)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_references_are_reported() {
        let error = FixturePaymentGateway::new()
            .fetch_status("missing")
            .await
            .expect_err("unknown");
        assert_eq!(error, PaymentGatewayError::unknown_reference("missing"));
    }
}
