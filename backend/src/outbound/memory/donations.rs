//! In-memory campaign and transaction repositories.
//!
//! Both repositories share one [`InMemoryDonationStore`], so a settlement
//! and its campaign credit happen under a single lock, and deleting a
//! campaign removes its transactions as the PostgreSQL cascade does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CampaignRepository, CampaignRepositoryError, TransactionRepository,
    TransactionRepositoryError,
};
use crate::domain::{
    CampaignId, CampaignStatus, DonationCampaign, Transaction, TransactionId, TransactionStatus,
    UserId,
};

use super::{lock, window};

#[derive(Debug, Default)]
struct DonationTables {
    campaigns: HashMap<CampaignId, DonationCampaign>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// Campaign and transaction tables behind one lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDonationStore {
    tables: Arc<Mutex<DonationTables>>,
}

impl InMemoryDonationStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Campaign repository over this store.
    pub fn campaigns(&self) -> InMemoryCampaignRepository {
        InMemoryCampaignRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    /// Transaction repository over this store.
    pub fn transactions(&self) -> InMemoryTransactionRepository {
        InMemoryTransactionRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

/// Donation campaigns keyed by id.
#[derive(Debug)]
pub struct InMemoryCampaignRepository {
    tables: Arc<Mutex<DonationTables>>,
}

fn status_rank(status: CampaignStatus) -> u8 {
    match status {
        CampaignStatus::Active => 0,
        CampaignStatus::Closed => 1,
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DonationCampaign>, CampaignRepositoryError> {
        let mut campaigns: Vec<DonationCampaign> =
            lock(&self.tables).campaigns.values().cloned().collect();
        campaigns.sort_by(|a, b| {
            status_rank(a.status)
                .cmp(&status_rank(b.status))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(window(campaigns, offset, limit))
    }

    async fn find(
        &self,
        id: &CampaignId,
    ) -> Result<Option<DonationCampaign>, CampaignRepositoryError> {
        Ok(lock(&self.tables).campaigns.get(id).cloned())
    }

    async fn insert(&self, campaign: &DonationCampaign) -> Result<(), CampaignRepositoryError> {
        lock(&self.tables)
            .campaigns
            .insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn update(&self, campaign: &DonationCampaign) -> Result<bool, CampaignRepositoryError> {
        Ok(match lock(&self.tables).campaigns.get_mut(&campaign.id) {
            Some(stored) => {
                let current_amount = stored.current_amount;
                *stored = campaign.clone();
                stored.current_amount = current_amount;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError> {
        let mut tables = lock(&self.tables);
        if tables.campaigns.remove(id).is_none() {
            return Ok(false);
        }
        tables
            .transactions
            .retain(|_, transaction| transaction.donation_id != *id);
        Ok(true)
    }
}

/// Donation transactions keyed by id.
#[derive(Debug)]
pub struct InMemoryTransactionRepository {
    tables: Arc<Mutex<DonationTables>>,
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError> {
        let mut tables = lock(&self.tables);
        if tables
            .transactions
            .values()
            .any(|stored| stored.provider_reference == transaction.provider_reference)
        {
            return Err(TransactionRepositoryError::duplicate_reference(
                transaction.provider_reference.clone(),
            ));
        }
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(lock(&self.tables).transactions.get(id).cloned())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(lock(&self.tables)
            .transactions
            .values()
            .find(|transaction| transaction.provider_reference == reference)
            .cloned())
    }

    async fn set_checkout_url(
        &self,
        id: &TransactionId,
        checkout_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), TransactionRepositoryError> {
        if let Some(transaction) = lock(&self.tables).transactions.get_mut(id) {
            transaction.checkout_url = Some(checkout_url.to_owned());
            transaction.updated_at = updated_at;
        }
        Ok(())
    }

    async fn transition(
        &self,
        id: &TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut tables = lock(&self.tables);
        let DonationTables {
            campaigns,
            transactions,
        } = &mut *tables;
        let Some(transaction) = transactions.get_mut(id) else {
            return Ok(None);
        };
        if transaction.status != from {
            return Ok(None);
        }
        if to.settles_from(from) {
            let campaign = campaigns.get_mut(&transaction.donation_id).ok_or_else(|| {
                TransactionRepositoryError::query(format!(
                    "campaign {} does not exist",
                    transaction.donation_id
                ))
            })?;
            campaign.current_amount = campaign.current_amount.saturating_add(transaction.amount);
        }
        transaction.status = to;
        transaction.updated_at = updated_at;
        Ok(Some(transaction.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionRepositoryError> {
        let mut owned: Vec<Transaction> = lock(&self.tables)
            .transactions
            .values()
            .filter(|transaction| transaction.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(window(owned, offset, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::test_support::fixture_now;
    use rstest::{fixture, rstest};

    fn campaign() -> DonationCampaign {
        DonationCampaign {
            id: CampaignId::random(),
            title: "Library renovation".to_owned(),
            description: String::new(),
            target_amount: 10_000,
            current_amount: 0,
            currency: Currency::new("EUR").expect("valid currency"),
            status: CampaignStatus::Active,
            deadline: None,
            created_by: UserId::random(),
            created_at: fixture_now(),
        }
    }

    fn transaction(donation_id: CampaignId, reference: &str) -> Transaction {
        Transaction {
            id: TransactionId::random(),
            donation_id,
            user_id: None,
            amount: 500,
            currency: Currency::new("EUR").expect("valid currency"),
            status: TransactionStatus::Pending,
            provider_reference: reference.to_owned(),
            checkout_url: None,
            created_at: fixture_now(),
            updated_at: fixture_now(),
        }
    }

    struct Seeded {
        campaigns: InMemoryCampaignRepository,
        transactions: InMemoryTransactionRepository,
        campaign: DonationCampaign,
    }

    #[fixture]
    fn seeded() -> Seeded {
        let store = InMemoryDonationStore::new();
        let campaign = campaign();
        let campaigns = store.campaigns();
        campaigns
            .tables
            .lock()
            .expect("store lock")
            .campaigns
            .insert(campaign.id, campaign.clone());
        Seeded {
            campaigns,
            transactions: store.transactions(),
            campaign,
        }
    }

    async fn complete(
        repo: &InMemoryTransactionRepository,
        id: &TransactionId,
    ) -> Option<Transaction> {
        repo.transition(
            id,
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            fixture_now(),
        )
        .await
        .expect("transition")
    }

    #[rstest]
    #[tokio::test]
    async fn completing_credits_the_campaign_exactly_once(seeded: Seeded) {
        let pending = transaction(seeded.campaign.id, "don_1");
        seeded.transactions.insert(&pending).await.expect("insert");

        let first = complete(&seeded.transactions, &pending.id).await;
        assert_eq!(first.map(|t| t.status), Some(TransactionStatus::Completed));
        assert!(complete(&seeded.transactions, &pending.id).await.is_none());

        let stored = seeded
            .campaigns
            .find(&seeded.campaign.id)
            .await
            .expect("find")
            .expect("campaign");
        assert_eq!(stored.current_amount, 500);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_payments_leave_the_total_alone(seeded: Seeded) {
        let pending = transaction(seeded.campaign.id, "don_2");
        seeded.transactions.insert(&pending).await.expect("insert");
        seeded
            .transactions
            .transition(
                &pending.id,
                TransactionStatus::Pending,
                TransactionStatus::Failed,
                fixture_now(),
            )
            .await
            .expect("transition");

        let stored = seeded
            .campaigns
            .find(&seeded.campaign.id)
            .await
            .expect("find")
            .expect("campaign");
        assert_eq!(stored.current_amount, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_campaign_removes_its_transactions(seeded: Seeded) {
        let pending = transaction(seeded.campaign.id, "don_3");
        let unrelated = transaction(CampaignId::random(), "don_4");
        seeded.transactions.insert(&pending).await.expect("insert");
        seeded.transactions.insert(&unrelated).await.expect("insert");

        assert!(seeded.campaigns.delete(&seeded.campaign.id).await.expect("delete"));

        assert!(seeded.transactions.find(&pending.id).await.expect("find").is_none());
        assert!(complete(&seeded.transactions, &pending.id).await.is_none());
        assert!(seeded.transactions.find(&unrelated.id).await.expect("find").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn completing_without_a_campaign_fails_and_stays_pending() {
        let store = InMemoryDonationStore::new();
        let transactions = store.transactions();
        let orphan = transaction(CampaignId::random(), "don_5");
        transactions.insert(&orphan).await.expect("insert");

        let error = transactions
            .transition(
                &orphan.id,
                TransactionStatus::Pending,
                TransactionStatus::Completed,
                fixture_now(),
            )
            .await
            .expect_err("missing campaign");
        assert!(matches!(error, TransactionRepositoryError::Query { .. }));
        let stored = transactions.find(&orphan.id).await.expect("find").expect("transaction");
        assert_eq!(stored.status, TransactionStatus::Pending);
    }

    #[rstest]
    #[tokio::test]
    async fn provider_references_are_unique(seeded: Seeded) {
        let repo = seeded.transactions;
        repo.insert(&transaction(seeded.campaign.id, "don_dup"))
            .await
            .expect("insert");
        let error = repo
            .insert(&transaction(seeded.campaign.id, "don_dup"))
            .await
            .expect_err("duplicate");
        assert_eq!(error, TransactionRepositoryError::duplicate_reference("don_dup"));
    }
}
