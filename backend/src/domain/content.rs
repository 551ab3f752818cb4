//! Authored content: events, opportunities, and stories.
//!
//! Each record is created by a signed-in user and may be edited or removed
//! by its author or an administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EventId, OpportunityId, StoryId, UserId};

/// Validated fields that can create or overwrite a content record.
pub trait ContentDraft: Send + 'static {
    /// Record type the draft produces.
    type Record;

    /// Build a new record authored by `author_id`.
    fn into_record(self, author_id: UserId, created_at: DateTime<Utc>) -> Self::Record;

    /// Overwrite the editable fields of `record`.
    fn apply_to(self, record: &mut Self::Record);
}

/// Maximum title length, in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum body or description length, in characters.
pub const BODY_MAX: usize = 20_000;

/// Validation errors shared by the content records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentValidationError {
    /// A required field was absent or blank.
    #[error("{field} is required")]
    Missing { field: &'static str },
    /// A text field exceeded its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    /// An event would end before it starts.
    #[error("endsAt must not be before startsAt")]
    EndsBeforeStart,
    /// A URL did not use http or https.
    #[error("{field} must start with http:// or https://")]
    InvalidUrl { field: &'static str },
}

impl ContentValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::TooLong { field, .. } | Self::InvalidUrl { field } => {
                field
            }
            Self::EndsBeforeStart => "endsAt",
        }
    }
}

fn required(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<String, ContentValidationError> {
    optional(value, field, max)?.ok_or(ContentValidationError::Missing { field })
}

fn optional(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ContentValidationError> {
    let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max {
        return Err(ContentValidationError::TooLong { field, max });
    }
    Ok(Some(text.to_owned()))
}

fn optional_url(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<String>, ContentValidationError> {
    let url = optional(value, field, TITLE_MAX * 10)?;
    if url
        .as_deref()
        .is_some_and(|url| !(url.starts_with("http://") || url.starts_with("https://")))
    {
        return Err(ContentValidationError::InvalidUrl { field });
    }
    Ok(url)
}

/// Alumni event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Raw event fields from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Validated event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl EventInput {
    /// Validate into an event draft.
    pub fn validate(&self) -> Result<EventDraft, ContentValidationError> {
        let title = required(self.title.as_deref(), "title", TITLE_MAX)?;
        let starts_at = self
            .starts_at
            .ok_or(ContentValidationError::Missing { field: "startsAt" })?;
        if self.ends_at.is_some_and(|ends_at| ends_at < starts_at) {
            return Err(ContentValidationError::EndsBeforeStart);
        }
        Ok(EventDraft {
            title,
            description: optional(self.description.as_deref(), "description", BODY_MAX)?
                .unwrap_or_default(),
            location: optional(self.location.as_deref(), "location", TITLE_MAX)?
                .unwrap_or_default(),
            starts_at,
            ends_at: self.ends_at,
        })
    }
}

impl ContentDraft for EventDraft {
    type Record = Event;

    fn into_record(self, author_id: UserId, created_at: DateTime<Utc>) -> Event {
        Event {
            id: EventId::random(),
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            author_id,
            created_at,
        }
    }

    fn apply_to(self, event: &mut Event) {
        event.title = self.title;
        event.description = self.description;
        event.location = self.location;
        event.starts_at = self.starts_at;
        event.ends_at = self.ends_at;
    }
}

/// Kind of professional opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Job,
    Internship,
    Mentorship,
    Volunteering,
}

impl OpportunityKind {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Internship => "internship",
            Self::Mentorship => "mentorship",
            Self::Volunteering => "volunteering",
        }
    }
}

impl std::str::FromStr for OpportunityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(Self::Job),
            "internship" => Ok(Self::Internship),
            "mentorship" => Ok(Self::Mentorship),
            "volunteering" => Ok(Self::Volunteering),
            other => Err(format!("unknown opportunity kind: {other}")),
        }
    }
}

/// Job, internship, mentorship, or volunteering offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: OpportunityId,
    pub title: String,
    pub organization: String,
    pub kind: OpportunityKind,
    pub description: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Raw opportunity fields from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityInput {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub kind: Option<OpportunityKind>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Validated opportunity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityDraft {
    pub title: String,
    pub organization: String,
    pub kind: OpportunityKind,
    pub description: String,
    pub location: String,
    pub apply_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl OpportunityInput {
    /// Validate into an opportunity draft.
    pub fn validate(&self) -> Result<OpportunityDraft, ContentValidationError> {
        Ok(OpportunityDraft {
            title: required(self.title.as_deref(), "title", TITLE_MAX)?,
            organization: required(self.organization.as_deref(), "organization", TITLE_MAX)?,
            kind: self
                .kind
                .ok_or(ContentValidationError::Missing { field: "kind" })?,
            description: optional(self.description.as_deref(), "description", BODY_MAX)?
                .unwrap_or_default(),
            location: optional(self.location.as_deref(), "location", TITLE_MAX)?
                .unwrap_or_default(),
            apply_url: optional_url(self.apply_url.as_deref(), "applyUrl")?,
            expires_at: self.expires_at,
        })
    }
}

impl ContentDraft for OpportunityDraft {
    type Record = Opportunity;

    fn into_record(self, author_id: UserId, created_at: DateTime<Utc>) -> Opportunity {
        Opportunity {
            id: OpportunityId::random(),
            title: self.title,
            organization: self.organization,
            kind: self.kind,
            description: self.description,
            location: self.location,
            apply_url: self.apply_url,
            expires_at: self.expires_at,
            author_id,
            created_at,
        }
    }

    fn apply_to(self, opportunity: &mut Opportunity) {
        opportunity.title = self.title;
        opportunity.organization = self.organization;
        opportunity.kind = self.kind;
        opportunity.description = self.description;
        opportunity.location = self.location;
        opportunity.apply_url = self.apply_url;
        opportunity.expires_at = self.expires_at;
    }
}

/// Alumni success story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Raw story fields from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryInput {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Validated story fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub body: String,
}

impl StoryInput {
    /// Validate into a story draft.
    pub fn validate(&self) -> Result<StoryDraft, ContentValidationError> {
        Ok(StoryDraft {
            title: required(self.title.as_deref(), "title", TITLE_MAX)?,
            body: required(self.body.as_deref(), "body", BODY_MAX)?,
        })
    }
}

impl ContentDraft for StoryDraft {
    type Record = Story;

    fn into_record(self, author_id: UserId, created_at: DateTime<Utc>) -> Story {
        Story {
            id: StoryId::random(),
            title: self.title,
            body: self.body,
            author_id,
            created_at,
        }
    }

    fn apply_to(self, story: &mut Story) {
        story.title = self.title;
        story.body = self.body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn events_require_title_and_start() {
        let missing_title = EventInput {
            starts_at: Some(start()),
            ..EventInput::default()
        };
        assert_eq!(missing_title.validate().expect_err("missing").field(), "title");

        let missing_start = EventInput {
            title: Some("Gala".to_owned()),
            ..EventInput::default()
        };
        assert_eq!(
            missing_start.validate().expect_err("missing").field(),
            "startsAt"
        );
    }

    #[rstest]
    fn events_reject_inverted_ranges() {
        let input = EventInput {
            title: Some("Gala".to_owned()),
            starts_at: Some(start()),
            ends_at: Some(start() - Duration::hours(1)),
            ..EventInput::default()
        };
        assert_eq!(
            input.validate().expect_err("inverted"),
            ContentValidationError::EndsBeforeStart
        );
    }

    #[rstest]
    #[case(None, Some("Acme"), Some(OpportunityKind::Job), "title")]
    #[case(Some("Engineer"), None, Some(OpportunityKind::Job), "organization")]
    #[case(Some("Engineer"), Some("Acme"), None, "kind")]
    fn opportunities_require_fields(
        #[case] title: Option<&str>,
        #[case] organization: Option<&str>,
        #[case] kind: Option<OpportunityKind>,
        #[case] field: &str,
    ) {
        let input = OpportunityInput {
            title: title.map(str::to_owned),
            organization: organization.map(str::to_owned),
            kind,
            ..OpportunityInput::default()
        };
        assert_eq!(input.validate().expect_err("missing").field(), field);
    }

    #[rstest]
    fn opportunity_apply_urls_must_be_http() {
        let input = OpportunityInput {
            title: Some("Engineer".to_owned()),
            organization: Some("Acme".to_owned()),
            kind: Some(OpportunityKind::Internship),
            apply_url: Some("mailto:jobs@acme.test".to_owned()),
            ..OpportunityInput::default()
        };
        assert_eq!(input.validate().expect_err("bad url").field(), "applyUrl");
    }

    #[rstest]
    fn stories_trim_fields() {
        let draft = StoryInput {
            title: Some("  From campus to orbit ".to_owned()),
            body: Some(" It started in the lab. ".to_owned()),
        }
        .validate()
        .expect("valid story");
        assert_eq!(draft.title, "From campus to orbit");
        assert_eq!(draft.body, "It started in the lab.");
    }

    #[rstest]
    fn stories_reject_overlong_titles() {
        let input = StoryInput {
            title: Some("t".repeat(TITLE_MAX + 1)),
            body: Some("body".to_owned()),
        };
        assert_eq!(
            input.validate().expect_err("too long"),
            ContentValidationError::TooLong {
                field: "title",
                max: TITLE_MAX
            }
        );
    }
}
