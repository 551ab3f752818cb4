//! In-memory `ContentRepository` shared by events, opportunities, and stories.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{
    ContentListQuery, ContentRecord, ContentRepository, ContentRepositoryError,
};

use super::{lock, window};

/// Content records keyed by id.
#[derive(Debug)]
pub struct InMemoryContentRepository<T: ContentRecord> {
    records: Mutex<HashMap<T::Id, T>>,
}

impl<T: ContentRecord> Default for InMemoryContentRepository<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ContentRecord> InMemoryContentRepository<T> {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: ContentRecord> ContentRepository<T> for InMemoryContentRepository<T> {
    async fn insert(&self, record: &T) -> Result<(), ContentRepositoryError> {
        lock(&self.records).insert(record.id(), record.clone());
        Ok(())
    }

    async fn find(&self, id: &T::Id) -> Result<Option<T>, ContentRepositoryError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    async fn update(&self, record: &T) -> Result<bool, ContentRepositoryError> {
        Ok(match lock(&self.records).get_mut(&record.id()) {
            Some(stored) => {
                *stored = record.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &T::Id) -> Result<bool, ContentRepositoryError> {
        Ok(lock(&self.records).remove(id).is_some())
    }

    async fn list(&self, query: &ContentListQuery) -> Result<Vec<T>, ContentRepositoryError> {
        let mut records: Vec<T> = lock(&self.records)
            .values()
            .filter(|record| query.upcoming_at.is_none_or(|now| record.is_upcoming(now)))
            .cloned()
            .collect();
        records.sort_by(T::list_order);
        Ok(window(records, query.offset, query.limit))
    }
}
