//! Port shared by the authored content records.
//!
//! Events, opportunities, and stories have identical persistence needs, so a
//! single trait is parameterised over [`ContentRecord`].

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Event, EventId, Opportunity, OpportunityId, Story, StoryId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by content repository adapters.
    pub enum ContentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "content repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "content repository query failed: {message}",
    }
}

/// Authored record stored through a [`ContentRepository`].
pub trait ContentRecord: Clone + Debug + Send + Sync + 'static {
    /// Identifier type.
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Human-readable record kind used in error messages.
    const KIND: &'static str;

    /// Record identifier.
    fn id(&self) -> Self::Id;

    /// Author of the record.
    fn author_id(&self) -> UserId;

    /// Listing order.
    fn list_order(a: &Self, b: &Self) -> Ordering;

    /// Whether the record survives the `upcoming` filter at `now`.
    fn is_upcoming(&self, _now: DateTime<Utc>) -> bool {
        true
    }
}

impl ContentRecord for Event {
    type Id = EventId;
    const KIND: &'static str = "event";

    fn id(&self) -> EventId {
        self.id
    }

    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id))
    }

    fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }
}

impl ContentRecord for Opportunity {
    type Id = OpportunityId;
    const KIND: &'static str = "opportunity";

    fn id(&self) -> OpportunityId {
        self.id
    }

    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
    }
}

impl ContentRecord for Story {
    type Id = StoryId;
    const KIND: &'static str = "story";

    fn id(&self) -> StoryId {
        self.id
    }

    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
    }
}

/// Listing parameters for content records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentListQuery {
    /// When set, only records still upcoming at this instant.
    pub upcoming_at: Option<DateTime<Utc>>,
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

#[async_trait]
pub trait ContentRepository<T: ContentRecord>: Send + Sync {
    /// Store a new record.
    async fn insert(&self, record: &T) -> Result<(), ContentRepositoryError>;

    /// Fetch a record.
    async fn find(&self, id: &T::Id) -> Result<Option<T>, ContentRepositoryError>;

    /// Replace a record. Returns `false` when it does not exist.
    async fn update(&self, record: &T) -> Result<bool, ContentRepositoryError>;

    /// Remove a record. Returns `false` when it did not exist.
    async fn delete(&self, id: &T::Id) -> Result<bool, ContentRepositoryError>;

    /// List records in [`ContentRecord::list_order`].
    async fn list(&self, query: &ContentListQuery) -> Result<Vec<T>, ContentRepositoryError>;
}
