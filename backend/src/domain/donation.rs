//! Donation campaigns and the transactions that fund them.
//!
//! Amounts are integer minor units. A transaction adds to its campaign only
//! on the first transition from pending to completed; see
//! [`TransactionStatus::settles_from`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CampaignId, TransactionId, UserId};

/// Maximum campaign title length, in characters.
pub const CAMPAIGN_TITLE_MAX: usize = 200;

/// Validation errors for donation input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DonationValidationError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    Missing { field: &'static str },
    /// Title exceeded [`CAMPAIGN_TITLE_MAX`].
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// Amount was zero or negative.
    #[error("{field} must be greater than zero")]
    NonPositiveAmount { field: &'static str },
    /// Currency was not three upper-case ASCII letters.
    #[error("currency must be a three-letter ISO 4217 code")]
    InvalidCurrency,
}

impl DonationValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::NonPositiveAmount { field } => field,
            Self::TitleTooLong { .. } => "title",
            Self::InvalidCurrency => "currency",
        }
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate a currency code. Lower-case input is upper-cased.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Currency;
    ///
    /// assert_eq!(Currency::new("eur").unwrap().as_ref(), "EUR");
    /// assert!(Currency::new("EURO").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DonationValidationError> {
        let code = raw.as_ref().trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|byte| byte.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(DonationValidationError::InvalidCurrency)
        }
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl TryFrom<String> for Currency {
    type Error = DonationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Whether a campaign accepts contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Accepting contributions.
    #[default]
    Active,
    /// Closed to new contributions.
    Closed,
}

impl CampaignStatus {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}

/// Fundraising campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCampaign {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub currency: Currency,
    pub status: CampaignStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl DonationCampaign {
    /// Whether the campaign accepts contributions at `now`.
    pub fn accepts_contributions(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && self.deadline.is_none_or(|deadline| now <= deadline)
    }
}

/// Validated campaign fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDraft {
    pub title: String,
    pub description: String,
    pub target_amount: i64,
    pub currency: Currency,
    pub deadline: Option<DateTime<Utc>>,
}

impl CampaignDraft {
    /// Validate raw campaign fields.
    pub fn try_new(
        title: &str,
        description: Option<&str>,
        target_amount: i64,
        currency: &str,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Self, DonationValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DonationValidationError::Missing { field: "title" });
        }
        if title.chars().count() > CAMPAIGN_TITLE_MAX {
            return Err(DonationValidationError::TitleTooLong {
                max: CAMPAIGN_TITLE_MAX,
            });
        }
        if target_amount <= 0 {
            return Err(DonationValidationError::NonPositiveAmount {
                field: "targetAmount",
            });
        }
        Ok(Self {
            title: title.to_owned(),
            description: description.map(str::trim).unwrap_or_default().to_owned(),
            target_amount,
            currency: Currency::new(currency)?,
            deadline,
        })
    }
}

/// Lifecycle of a donation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting payment.
    Pending,
    /// Paid.
    Completed,
    /// Payment refused.
    Failed,
    /// Payment abandoned by the donor.
    Cancelled,
}

impl TransactionStatus {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving from `previous` to `self` should credit the campaign.
    pub fn settles_from(self, previous: Self) -> bool {
        previous == Self::Pending && self == Self::Completed
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Gift towards a campaign, settled through the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub donation_id: CampaignId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub amount: i64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub provider_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate a contribution amount in minor units.
pub fn validate_amount(amount: i64) -> Result<i64, DonationValidationError> {
    if amount <= 0 {
        return Err(DonationValidationError::NonPositiveAmount { field: "amount" });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("usd", Ok("USD"))]
    #[case(" XOF ", Ok("XOF"))]
    #[case("US", Err(DonationValidationError::InvalidCurrency))]
    #[case("U5D", Err(DonationValidationError::InvalidCurrency))]
    #[case("ÉUR", Err(DonationValidationError::InvalidCurrency))]
    fn currency_codes(#[case] raw: &str, #[case] expected: Result<&str, DonationValidationError>) {
        let parsed = Currency::new(raw).map(String::from);
        assert_eq!(parsed, expected.map(str::to_owned));
    }

    #[rstest]
    #[case("", 100, "EUR", "title")]
    #[case("Library", 0, "EUR", "targetAmount")]
    #[case("Library", -5, "EUR", "targetAmount")]
    #[case("Library", 100, "euros", "currency")]
    fn campaign_draft_validation(
        #[case] title: &str,
        #[case] target: i64,
        #[case] currency: &str,
        #[case] field: &str,
    ) {
        let err = CampaignDraft::try_new(title, None, target, currency, None).expect_err("invalid");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    #[case(TransactionStatus::Pending, TransactionStatus::Completed, true)]
    #[case(TransactionStatus::Completed, TransactionStatus::Completed, false)]
    #[case(TransactionStatus::Pending, TransactionStatus::Failed, false)]
    #[case(TransactionStatus::Failed, TransactionStatus::Completed, false)]
    fn only_first_completion_settles(
        #[case] previous: TransactionStatus,
        #[case] next: TransactionStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(next.settles_from(previous), expected);
    }

    #[rstest]
    fn zero_amounts_are_rejected() {
        assert_eq!(validate_amount(0).expect_err("zero").field(), "amount");
        assert_eq!(validate_amount(500), Ok(500));
    }
}
