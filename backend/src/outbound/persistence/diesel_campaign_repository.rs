//! PostgreSQL-backed `CampaignRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{CampaignRepository, CampaignRepositoryError};
use crate::domain::{CampaignId, Currency, DonationCampaign, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound};
use super::models::{CampaignRow, CampaignUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::donation_campaigns;

/// Diesel-backed campaign store.
#[derive(Clone)]
pub struct DieselCampaignRepository {
    pool: DbPool,
}

impl DieselCampaignRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CampaignRepositoryError {
    map_pool_error(error, CampaignRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CampaignRepositoryError {
    map_diesel_error(
        error,
        CampaignRepositoryError::query,
        CampaignRepositoryError::connection,
    )
}

fn to_row(campaign: &DonationCampaign) -> CampaignRow {
    CampaignRow {
        id: *campaign.id.as_uuid(),
        title: campaign.title.clone(),
        description: campaign.description.clone(),
        target_amount: campaign.target_amount,
        current_amount: campaign.current_amount,
        currency: campaign.currency.to_string(),
        status: campaign.status.as_str().to_owned(),
        deadline: campaign.deadline,
        created_by: *campaign.created_by.as_uuid(),
        created_at: campaign.created_at,
    }
}

fn from_row(row: CampaignRow) -> Result<DonationCampaign, CampaignRepositoryError> {
    let invalid = |column: &'static str| {
        warn!(campaign_id = %row.id, column, "stored campaign row is invalid");
        CampaignRepositoryError::query(format!("stored campaign has invalid {column}"))
    };
    let currency = Currency::new(&row.currency).map_err(|_| invalid("currency"))?;
    let status = row.status.parse().map_err(|_| invalid("status"))?;
    Ok(DonationCampaign {
        id: CampaignId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        target_amount: row.target_amount,
        current_amount: row.current_amount,
        currency,
        status,
        deadline: row.deadline,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
    })
}

#[async_trait]
impl CampaignRepository for DieselCampaignRepository {
    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DonationCampaign>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        // 'active' sorts before 'closed'.
        let rows = donation_campaigns::table
            .select(CampaignRow::as_select())
            .order((
                donation_campaigns::status.asc(),
                donation_campaigns::created_at.desc(),
                donation_campaigns::id.asc(),
            ))
            .offset(sql_bound(offset))
            .limit(sql_bound(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(from_row).collect()
    }

    async fn find(
        &self,
        id: &CampaignId,
    ) -> Result<Option<DonationCampaign>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        donation_campaigns::table
            .find(id.as_uuid())
            .select(CampaignRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn insert(&self, campaign: &DonationCampaign) -> Result<(), CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(donation_campaigns::table)
            .values(&to_row(campaign))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn update(&self, campaign: &DonationCampaign) -> Result<bool, CampaignRepositoryError> {
        let currency = campaign.currency.to_string();
        let changes = CampaignUpdate {
            title: &campaign.title,
            description: &campaign.description,
            target_amount: campaign.target_amount,
            currency: &currency,
            status: campaign.status.as_str(),
            deadline: campaign.deadline,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::update(donation_campaigns::table.find(campaign.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }

    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::delete(donation_campaigns::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }
}
