//! In-memory adapters for every persistence port.
//!
//! Used when no database URL is configured and by the HTTP and integration
//! tests. State lives behind `std::sync::Mutex`; guards are always dropped
//! before the adapter returns, so no lock is held across an `.await`.

use std::sync::{Mutex, MutexGuard, PoisonError};

mod communities;
mod content;
mod donations;
mod profiles;
mod users;

pub use communities::{InMemoryCommunityPostRepository, InMemoryCommunityRepository};
pub use content::InMemoryContentRepository;
pub use donations::{
    InMemoryCampaignRepository, InMemoryDonationStore, InMemoryTransactionRepository,
};
pub use profiles::InMemoryProfileRepository;
pub use users::InMemoryUserRepository;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Apply offset/limit to an already ordered sequence.
fn window<T>(items: impl IntoIterator<Item = T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}
