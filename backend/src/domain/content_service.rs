//! Use-cases shared by events, opportunities, and stories.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;

use crate::domain::ports::{
    ContentListQuery, ContentRecord, ContentRepository, ContentRepositoryError,
};
use crate::domain::{
    Actor, ContentDraft, ContentValidationError, Error, Event, Opportunity, Story,
};

/// Authored content use-cases for one record type.
pub struct ContentService<T: ContentRecord> {
    records: Arc<dyn ContentRepository<T>>,
    clock: Arc<dyn Clock>,
}

/// Service for alumni events.
pub type EventService = ContentService<Event>;
/// Service for professional opportunities.
pub type OpportunityService = ContentService<Opportunity>;
/// Service for success stories.
pub type StoryService = ContentService<Story>;

impl<T: ContentRecord> Clone for ContentService<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            clock: Arc::clone(&self.clock),
        }
    }
}

fn map_content_error(error: ContentRepositoryError) -> Error {
    match error {
        ContentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("content repository unavailable: {message}"))
        }
        ContentRepositoryError::Query { message } => {
            Error::internal(format!("content repository error: {message}"))
        }
    }
}

/// Map a content validation failure to a field-level request error.
pub fn map_content_validation(error: ContentValidationError) -> Error {
    let code = match error {
        ContentValidationError::Missing { .. } => "missing_field",
        _ => "invalid_field",
    };
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": error.field(), "code": code }))
}

impl<T: ContentRecord> ContentService<T> {
    /// Create the service.
    pub fn new(records: Arc<dyn ContentRepository<T>>, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    fn not_found() -> Error {
        Error::not_found(format!("{} not found", T::KIND))
    }

    /// Publish a new record authored by `actor`.
    pub async fn create<D>(&self, actor: &Actor, draft: D) -> Result<T, Error>
    where
        D: ContentDraft<Record = T>,
    {
        let record = draft.into_record(actor.id, self.clock.utc());
        self.records
            .insert(&record)
            .await
            .map_err(map_content_error)?;
        tracing::debug!(kind = T::KIND, id = %record.id(), "content created");
        Ok(record)
    }

    /// One page of records in their listing order. With `upcoming`, records
    /// that are already over are skipped.
    pub async fn list(&self, upcoming: bool, page: &PageRequest) -> Result<Page<T>, Error> {
        let query = ContentListQuery {
            upcoming_at: upcoming.then(|| self.clock.utc()),
            offset: page.offset(),
            limit: page.fetch_size(),
        };
        let window = self
            .records
            .list(&query)
            .await
            .map_err(map_content_error)?;
        Ok(Page::from_window(window, page))
    }

    /// Fetch one record.
    pub async fn get(&self, id: &T::Id) -> Result<T, Error> {
        self.records
            .find(id)
            .await
            .map_err(map_content_error)?
            .ok_or_else(Self::not_found)
    }

    async fn editable(&self, actor: &Actor, id: &T::Id) -> Result<T, Error> {
        let record = self.get(id).await?;
        if actor.can_edit(record.author_id()) {
            Ok(record)
        } else {
            Err(Error::forbidden(format!(
                "only the author or an administrator may change this {}",
                T::KIND
            )))
        }
    }

    /// Overwrite a record's editable fields. Author or administrator only.
    pub async fn update<D>(&self, actor: &Actor, id: &T::Id, draft: D) -> Result<T, Error>
    where
        D: ContentDraft<Record = T>,
    {
        let mut record = self.editable(actor, id).await?;
        draft.apply_to(&mut record);
        if self
            .records
            .update(&record)
            .await
            .map_err(map_content_error)?
        {
            Ok(record)
        } else {
            Err(Self::not_found())
        }
    }

    /// Remove a record. Author or administrator only.
    pub async fn delete(&self, actor: &Actor, id: &T::Id) -> Result<(), Error> {
        self.editable(actor, id).await?;
        if self.records.delete(id).await.map_err(map_content_error)? {
            Ok(())
        } else {
            Err(Self::not_found())
        }
    }
}

#[cfg(test)]
#[path = "content_service_tests.rs"]
mod tests;
