//! Wire DTOs for the payment gateway JSON contract.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{CheckoutRequest, GatewayPaymentStatus};

#[derive(Debug, Serialize)]
pub(super) struct CreatePaymentDto<'a> {
    pub(super) reference: &'a str,
    pub(super) amount: i64,
    pub(super) currency: &'a str,
    pub(super) description: &'a str,
}

impl<'a> From<&'a CheckoutRequest> for CreatePaymentDto<'a> {
    fn from(request: &'a CheckoutRequest) -> Self {
        Self {
            reference: &request.reference,
            amount: request.amount,
            currency: request.currency.as_ref(),
            description: &request.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckoutDto {
    pub(super) checkout_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentStatusDto {
    pub(super) reference: String,
    pub(super) status: StatusDto,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum StatusDto {
    Pending,
    Accepted,
    Refused,
    Cancelled,
}

impl From<StatusDto> for GatewayPaymentStatus {
    fn from(status: StatusDto) -> Self {
        match status {
            StatusDto::Pending => Self::Pending,
            StatusDto::Accepted => Self::Accepted,
            StatusDto::Refused => Self::Refused,
            StatusDto::Cancelled => Self::Cancelled,
        }
    }
}
