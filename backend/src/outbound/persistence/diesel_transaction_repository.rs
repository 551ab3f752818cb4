//! PostgreSQL-backed `TransactionRepository`.
//!
//! `transition` is a conditional `UPDATE ... WHERE status = $from
//! RETURNING *`, so concurrent webhook deliveries cannot both observe the
//! pending state. A settling transition credits the campaign inside the same
//! database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{TransactionRepository, TransactionRepositoryError};
use crate::domain::{
    CampaignId, Currency, Transaction, TransactionId, TransactionStatus, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound, unique_violation};
use super::models::TransactionRow;
use super::pool::{DbPool, PoolError};
use super::schema::{donation_campaigns, donation_transactions};

/// Diesel-backed transaction store.
#[derive(Clone)]
pub struct DieselTransactionRepository {
    pool: DbPool,
}

impl DieselTransactionRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> TransactionRepositoryError {
    map_pool_error(error, TransactionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> TransactionRepositoryError {
    map_diesel_error(
        error,
        TransactionRepositoryError::query,
        TransactionRepositoryError::connection,
    )
}

fn to_row(transaction: &Transaction) -> TransactionRow {
    TransactionRow {
        id: *transaction.id.as_uuid(),
        donation_id: *transaction.donation_id.as_uuid(),
        user_id: transaction.user_id.map(|id| *id.as_uuid()),
        amount: transaction.amount,
        currency: transaction.currency.to_string(),
        status: transaction.status.as_str().to_owned(),
        provider_reference: transaction.provider_reference.clone(),
        checkout_url: transaction.checkout_url.clone(),
        created_at: transaction.created_at,
        updated_at: transaction.updated_at,
    }
}

fn from_row(row: TransactionRow) -> Result<Transaction, TransactionRepositoryError> {
    let invalid = |column: &'static str| {
        warn!(transaction_id = %row.id, column, "stored transaction row is invalid");
        TransactionRepositoryError::query(format!("stored transaction has invalid {column}"))
    };
    let currency = Currency::new(&row.currency).map_err(|_| invalid("currency"))?;
    let status: TransactionStatus = row.status.parse().map_err(|_| invalid("status"))?;
    Ok(Transaction {
        id: TransactionId::from_uuid(row.id),
        donation_id: CampaignId::from_uuid(row.donation_id),
        user_id: row.user_id.map(UserId::from_uuid),
        amount: row.amount,
        currency,
        status,
        provider_reference: row.provider_reference,
        checkout_url: row.checkout_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl TransactionRepository for DieselTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(donation_transactions::table)
            .values(&to_row(transaction))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if unique_violation(&error).is_some() {
                    TransactionRepositoryError::duplicate_reference(
                        transaction.provider_reference.as_str(),
                    )
                } else {
                    diesel_error(error)
                }
            })
    }

    async fn find(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        donation_transactions::table
            .find(id.as_uuid())
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        donation_transactions::table
            .filter(donation_transactions::provider_reference.eq(reference))
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn set_checkout_url(
        &self,
        id: &TransactionId,
        checkout_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(donation_transactions::table.find(id.as_uuid()))
            .set((
                donation_transactions::checkout_url.eq(checkout_url),
                donation_transactions::updated_at.eq(updated_at),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn transition(
        &self,
        id: &TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let transaction_id = *id.as_uuid();
        let credits = to.settles_from(from);
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let Some(row) = diesel::update(
                        donation_transactions::table
                            .find(transaction_id)
                            .filter(donation_transactions::status.eq(from.as_str())),
                    )
                    .set((
                        donation_transactions::status.eq(to.as_str()),
                        donation_transactions::updated_at.eq(updated_at),
                    ))
                    .returning(TransactionRow::as_returning())
                    .get_result::<TransactionRow>(conn)
                    .await
                    .optional()?
                    else {
                        return Ok(None);
                    };

                    if credits {
                        let credited =
                            diesel::update(donation_campaigns::table.find(row.donation_id))
                                .set(
                                    donation_campaigns::current_amount
                                        .eq(donation_campaigns::current_amount + row.amount),
                                )
                                .execute(conn)
                                .await?;
                        // Missing campaign: roll the status change back.
                        if credited == 0 {
                            return Err(diesel::result::Error::NotFound);
                        }
                    }
                    Ok(Some(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error)?;
        row.map(from_row).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = donation_transactions::table
            .filter(donation_transactions::user_id.eq(user_id.as_uuid()))
            .select(TransactionRow::as_select())
            .order((
                donation_transactions::created_at.desc(),
                donation_transactions::id.asc(),
            ))
            .offset(sql_bound(offset))
            .limit(sql_bound(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_now;
    use rstest::rstest;

    #[rstest]
    #[case(None)]
    #[case(Some(UserId::random()))]
    fn anonymous_and_signed_in_donors_round_trip(#[case] donor: Option<UserId>) {
        let original = Transaction {
            id: TransactionId::random(),
            donation_id: CampaignId::random(),
            user_id: donor,
            amount: 2_500,
            currency: Currency::new("XOF").expect("currency"),
            status: TransactionStatus::Pending,
            provider_reference: "don_0123456789abcdef".to_owned(),
            checkout_url: None,
            created_at: fixture_now(),
            updated_at: fixture_now(),
        };
        assert_eq!(from_row(to_row(&original)).expect("valid"), original);
    }

    #[rstest]
    fn unknown_statuses_are_query_errors() {
        let mut row = to_row(&Transaction {
            id: TransactionId::random(),
            donation_id: CampaignId::random(),
            user_id: None,
            amount: 1,
            currency: Currency::new("EUR").expect("currency"),
            status: TransactionStatus::Completed,
            provider_reference: "don_1".to_owned(),
            checkout_url: None,
            created_at: fixture_now(),
            updated_at: fixture_now(),
        });
        row.status = "refunded".to_owned();
        assert!(matches!(
            from_row(row),
            Err(TransactionRepositoryError::Query { .. })
        ));
    }
}
