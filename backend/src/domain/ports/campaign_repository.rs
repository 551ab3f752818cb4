//! Port for donation campaign persistence.

use async_trait::async_trait;

use crate::domain::{CampaignId, DonationCampaign};

use super::define_port_error;

define_port_error! {
    /// Errors raised by campaign repository adapters.
    pub enum CampaignRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "campaign repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "campaign repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Campaigns with active ones first, then newest first.
    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DonationCampaign>, CampaignRepositoryError>;

    /// Fetch one campaign.
    async fn find(&self, id: &CampaignId)
    -> Result<Option<DonationCampaign>, CampaignRepositoryError>;

    /// Store a new campaign.
    async fn insert(&self, campaign: &DonationCampaign) -> Result<(), CampaignRepositoryError>;

    /// Replace the editable fields and status. `current_amount` is left
    /// untouched. Returns `false` when the campaign does not exist.
    async fn update(&self, campaign: &DonationCampaign) -> Result<bool, CampaignRepositoryError>;

    /// Remove a campaign and its transactions. Returns `false` when it did
    /// not exist.
    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError>;
}
