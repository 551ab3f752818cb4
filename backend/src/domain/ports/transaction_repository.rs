//! Port for donation transaction persistence.
//!
//! Status changes go through [`TransactionRepository::transition`], a
//! compare-and-set on the current status. A transition that settles the
//! payment credits the campaign in the same atomic write, so replays cannot
//! double count and a failed credit leaves the transaction pending.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Transaction, TransactionId, TransactionStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by transaction repository adapters.
    pub enum TransactionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "transaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "transaction repository query failed: {message}",
        /// The provider reference is already in use.
        DuplicateReference { reference: String } =>
            "provider reference already in use: {reference}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store a new transaction.
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError>;

    /// Fetch one transaction.
    async fn find(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Fetch a transaction by provider reference.
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Record the gateway checkout URL.
    async fn set_checkout_url(
        &self,
        id: &TransactionId,
        checkout_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), TransactionRepositoryError>;

    /// Move `id` from `from` to `to`. Returns the updated transaction, or
    /// `None` when its status was no longer `from`.
    ///
    /// When `to.settles_from(from)`, the transaction amount is added to its
    /// campaign's `current_amount` atomically with the status change. If the
    /// credit cannot be applied, nothing is written.
    async fn transition(
        &self,
        id: &TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Transactions made by a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionRepositoryError>;
}
