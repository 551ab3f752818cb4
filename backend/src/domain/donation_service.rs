//! Donation campaigns, contributions, and payment settlement.
//!
//! Settlement is driven by a single status poll against the gateway, either
//! from the webhook receiver or from an explicit refresh. Campaign totals are
//! credited by [`TransactionRepository::transition`] itself, in the same
//! write as the first move from pending to completed.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::domain::ports::{
    CampaignRepository, CampaignRepositoryError, CheckoutRequest, PaymentGateway,
    PaymentGatewayError, TransactionRepository, TransactionRepositoryError,
};
use crate::domain::{
    Actor, CampaignDraft, CampaignId, CampaignStatus, DonationCampaign, DonationValidationError,
    Error, Transaction, TransactionId, TransactionStatus, UserId, validate_amount,
};

/// Prefix of provider references generated for transactions.
pub const REFERENCE_PREFIX: &str = "don_";

/// Shared secret the gateway presents on webhook calls.
#[derive(Clone)]
pub struct WebhookSecret(Option<[u8; 32]>);

impl WebhookSecret {
    /// Accept callbacks carrying `token`. An empty token disables webhooks.
    pub fn new(token: &str) -> Self {
        if token.is_empty() {
            Self(None)
        } else {
            Self(Some(Sha256::digest(token.as_bytes()).into()))
        }
    }

    /// Reject every callback.
    pub fn disabled() -> Self {
        Self(None)
    }

    /// Compare digests so the check does not depend on where the strings
    /// first differ.
    pub fn matches(&self, presented: Option<&str>) -> bool {
        let (Some(expected), Some(presented)) = (self.0, presented) else {
            return false;
        };
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        expected
            .iter()
            .zip(presented.iter())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(..)")
    }
}

/// Donation use-cases.
#[derive(Clone)]
pub struct DonationService {
    campaigns: Arc<dyn CampaignRepository>,
    transactions: Arc<dyn TransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    webhook_secret: WebhookSecret,
}

fn map_campaign_error(error: CampaignRepositoryError) -> Error {
    match error {
        CampaignRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("campaign repository unavailable: {message}"))
        }
        CampaignRepositoryError::Query { message } => {
            Error::internal(format!("campaign repository error: {message}"))
        }
    }
}

fn map_transaction_error(error: TransactionRepositoryError) -> Error {
    match error {
        TransactionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("transaction repository unavailable: {message}"))
        }
        other => Error::internal(format!("transaction repository error: {other}")),
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::UnknownReference { reference } => {
            Error::not_found(format!("payment {reference} unknown to gateway"))
        }
        other => Error::service_unavailable(other.to_string()),
    }
}

/// Map a donation validation failure to a field-level request error.
pub fn map_donation_validation(error: DonationValidationError) -> Error {
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": error.field(), "code": "invalid_field" }))
}

fn require_admin(actor: &Actor) -> Result<(), Error> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("administrator role required"))
    }
}

fn campaign_not_found() -> Error {
    Error::not_found("donation campaign not found")
}

fn transaction_not_found() -> Error {
    Error::not_found("transaction not found")
}

fn generate_reference() -> String {
    let mut bytes = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{REFERENCE_PREFIX}{}", hex::encode(bytes))
}

impl DonationService {
    /// Create the service.
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        transactions: Arc<dyn TransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        webhook_secret: WebhookSecret,
    ) -> Self {
        Self {
            campaigns,
            transactions,
            gateway,
            clock,
            webhook_secret,
        }
    }

    /// Campaigns, active first then newest.
    pub async fn list_campaigns(&self, page: &PageRequest) -> Result<Page<DonationCampaign>, Error> {
        let window = self
            .campaigns
            .list(page.offset(), page.fetch_size())
            .await
            .map_err(map_campaign_error)?;
        Ok(Page::from_window(window, page))
    }

    /// Fetch one campaign.
    pub async fn get_campaign(&self, id: &CampaignId) -> Result<DonationCampaign, Error> {
        self.campaigns
            .find(id)
            .await
            .map_err(map_campaign_error)?
            .ok_or_else(campaign_not_found)
    }

    /// Open a campaign. Administrators only.
    pub async fn create_campaign(
        &self,
        actor: &Actor,
        draft: CampaignDraft,
    ) -> Result<DonationCampaign, Error> {
        require_admin(actor)?;
        let campaign = DonationCampaign {
            id: CampaignId::random(),
            title: draft.title,
            description: draft.description,
            target_amount: draft.target_amount,
            current_amount: 0,
            currency: draft.currency,
            status: CampaignStatus::Active,
            deadline: draft.deadline,
            created_by: actor.id,
            created_at: self.clock.utc(),
        };
        self.campaigns
            .insert(&campaign)
            .await
            .map_err(map_campaign_error)?;
        Ok(campaign)
    }

    /// Replace a campaign's editable fields and optionally change its
    /// status. Administrators only.
    pub async fn update_campaign(
        &self,
        actor: &Actor,
        id: &CampaignId,
        draft: CampaignDraft,
        status: Option<CampaignStatus>,
    ) -> Result<DonationCampaign, Error> {
        require_admin(actor)?;
        let mut campaign = self.get_campaign(id).await?;
        campaign.title = draft.title;
        campaign.description = draft.description;
        campaign.target_amount = draft.target_amount;
        campaign.currency = draft.currency;
        campaign.deadline = draft.deadline;
        if let Some(status) = status {
            campaign.status = status;
        }
        self.save_campaign(&campaign).await?;
        Ok(campaign)
    }

    /// Stop accepting contributions. Administrators only.
    pub async fn close_campaign(&self, actor: &Actor, id: &CampaignId) -> Result<DonationCampaign, Error> {
        require_admin(actor)?;
        let mut campaign = self.get_campaign(id).await?;
        campaign.status = CampaignStatus::Closed;
        self.save_campaign(&campaign).await?;
        Ok(campaign)
    }

    async fn save_campaign(&self, campaign: &DonationCampaign) -> Result<(), Error> {
        if self
            .campaigns
            .update(campaign)
            .await
            .map_err(map_campaign_error)?
        {
            Ok(())
        } else {
            Err(campaign_not_found())
        }
    }

    /// Delete a campaign. Administrators only.
    pub async fn delete_campaign(&self, actor: &Actor, id: &CampaignId) -> Result<(), Error> {
        require_admin(actor)?;
        if self.campaigns.delete(id).await.map_err(map_campaign_error)? {
            Ok(())
        } else {
            Err(campaign_not_found())
        }
    }

    /// Start a contribution: record a pending transaction and open a
    /// gateway checkout for it. Anonymous gifts have no `donor`.
    pub async fn contribute(
        &self,
        campaign_id: &CampaignId,
        donor: Option<UserId>,
        amount: i64,
    ) -> Result<Transaction, Error> {
        let amount = validate_amount(amount).map_err(map_donation_validation)?;
        let campaign = self.get_campaign(campaign_id).await?;
        let now = self.clock.utc();
        if !campaign.accepts_contributions(now) {
            return Err(Error::conflict("campaign is not accepting contributions"));
        }

        let mut transaction = Transaction {
            id: TransactionId::random(),
            donation_id: campaign.id,
            user_id: donor,
            amount,
            currency: campaign.currency.clone(),
            status: TransactionStatus::Pending,
            provider_reference: generate_reference(),
            checkout_url: None,
            created_at: now,
            updated_at: now,
        };
        self.transactions
            .insert(&transaction)
            .await
            .map_err(map_transaction_error)?;

        let checkout = self
            .gateway
            .create_checkout(&CheckoutRequest {
                reference: transaction.provider_reference.clone(),
                amount,
                currency: campaign.currency.clone(),
                description: campaign.title.clone(),
            })
            .await
            .map_err(map_gateway_error)?;
        self.transactions
            .set_checkout_url(&transaction.id, &checkout.checkout_url, now)
            .await
            .map_err(map_transaction_error)?;
        transaction.checkout_url = Some(checkout.checkout_url);
        Ok(transaction)
    }

    /// Poll the gateway once and apply the reported status.
    async fn settle(&self, transaction: Transaction) -> Result<Transaction, Error> {
        if transaction.status.is_final() {
            return Ok(transaction);
        }
        let reported = self
            .gateway
            .fetch_status(&transaction.provider_reference)
            .await
            .map_err(map_gateway_error)?
            .transaction_status();
        if reported == transaction.status {
            return Ok(transaction);
        }

        let moved = self
            .transactions
            .transition(&transaction.id, transaction.status, reported, self.clock.utc())
            .await
            .map_err(map_transaction_error)?;
        match moved {
            Some(updated) => {
                tracing::info!(
                    transaction_id = %updated.id,
                    status = updated.status.as_str(),
                    "transaction settled"
                );
                Ok(updated)
            }
            // Another caller settled it first; report what they stored.
            None => self
                .transactions
                .find(&transaction.id)
                .await
                .map_err(map_transaction_error)?
                .ok_or_else(transaction_not_found),
        }
    }

    /// Handle a gateway callback for `reference`.
    ///
    /// The callback body is never trusted for the status; the gateway is
    /// polled instead. Replays of settled transactions are no-ops.
    pub async fn handle_webhook(
        &self,
        reference: &str,
        presented_token: Option<&str>,
    ) -> Result<Transaction, Error> {
        if !self.webhook_secret.matches(presented_token) {
            return Err(Error::unauthorized("invalid webhook token"));
        }
        let transaction = self
            .transactions
            .find_by_reference(reference.trim())
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(transaction_not_found)?;
        self.settle(transaction).await
    }

    /// Fetch a transaction, polling the gateway once if it is still
    /// pending. Owner or administrator only.
    pub async fn refresh_status(&self, actor: &Actor, id: &TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .transactions
            .find(id)
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(transaction_not_found)?;
        let owned = transaction.user_id == Some(actor.id);
        if !owned && !actor.role.is_admin() {
            return Err(Error::forbidden("not your transaction"));
        }
        self.settle(transaction).await
    }

    /// The caller's transactions, newest first.
    pub async fn my_transactions(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, Error> {
        let window = self
            .transactions
            .list_for_user(user_id, page.offset(), page.fetch_size())
            .await
            .map_err(map_transaction_error)?;
        Ok(Page::from_window(window, page))
    }
}

#[cfg(test)]
#[path = "donation_service_tests.rs"]
mod tests;
