//! Communities, memberships, and community posts.
//!
//! Communities group alumni by a shared attribute. Matching a profile to the
//! communities it belongs in lives in [`matching`]; slug derivation lives in
//! [`crate::domain::slug`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::slug::{is_valid_slug, slugify, truncate_slug};
use super::{CommunityId, PostId, UserId};

pub mod matching;

/// Maximum length of a community post body, in characters.
pub const POST_CONTENT_MAX: usize = 5000;
/// Maximum length of a community name, in characters.
pub const COMMUNITY_NAME_MAX: usize = 120;
/// Maximum length of a community slug, in bytes.
pub const COMMUNITY_SLUG_MAX: usize = 160;

/// Attribute a community groups members by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityCategory {
    /// Graduating class, keyed by promotion year.
    Promotion,
    /// Faculty or school.
    Faculty,
    /// Department within a faculty.
    Department,
    /// Country of residence.
    Region,
    /// Professional field.
    Profession,
}

impl CommunityCategory {
    /// All categories, in matching order.
    pub const ALL: [Self; 5] = [
        Self::Promotion,
        Self::Faculty,
        Self::Department,
        Self::Region,
        Self::Profession,
    ];

    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Promotion => "promotion",
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Region => "region",
            Self::Profession => "profession",
        }
    }
}

impl fmt::Display for CommunityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommunityCategory {
    type Err = CommunityValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CommunityValidationError::UnknownCategory(s.to_owned()))
    }
}

/// Who may see a community's posts and join it freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunityPrivacy {
    /// Anyone may read posts and join.
    #[default]
    Public,
    /// Only members read posts; joining requires moderator rights.
    Private,
}

impl CommunityPrivacy {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl std::str::FromStr for CommunityPrivacy {
    type Err = CommunityValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(CommunityValidationError::UnknownPrivacy(other.to_owned())),
        }
    }
}

/// Validation errors for community input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommunityValidationError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    Missing { field: &'static str },
    /// Name exceeded [`COMMUNITY_NAME_MAX`].
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Slug contained characters outside `[a-z0-9-]` or exceeded
    /// [`COMMUNITY_SLUG_MAX`].
    #[error("slug must be at most 160 lowercase letters, digits, and hyphens")]
    InvalidSlug,
    /// Category string was not recognised.
    #[error("unknown community category: {0}")]
    UnknownCategory(String),
    /// Privacy string was not recognised.
    #[error("unknown community privacy: {0}")]
    UnknownPrivacy(String),
    /// Post content was blank or too long.
    #[error("content must be between 1 and {max} characters")]
    PostContentLength { max: usize },
}

impl CommunityValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } => field,
            Self::NameTooLong { .. } => "name",
            Self::InvalidSlug => "slug",
            Self::UnknownCategory(_) => "category",
            Self::UnknownPrivacy(_) => "privacy",
            Self::PostContentLength { .. } => "content",
        }
    }
}

/// Community record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    /// Identifier.
    pub id: CommunityId,
    /// Display name.
    pub name: String,
    /// Unique URL-safe key.
    pub slug: String,
    /// Grouping attribute.
    pub category: CommunityCategory,
    /// Free-form description.
    pub description: String,
    /// Visibility of posts and join policy.
    pub privacy: CommunityPrivacy,
    /// Number of membership rows.
    pub member_count: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityDraft {
    /// Display name.
    pub name: String,
    /// Unique URL-safe key.
    pub slug: String,
    /// Grouping attribute.
    pub category: CommunityCategory,
    /// Free-form description.
    pub description: String,
    /// Visibility of posts and join policy.
    pub privacy: CommunityPrivacy,
}

impl CommunityDraft {
    /// Validate raw community fields.
    ///
    /// A missing slug is derived from the name.
    pub fn try_new(
        name: &str,
        slug: Option<&str>,
        category: CommunityCategory,
        description: Option<&str>,
        privacy: CommunityPrivacy,
    ) -> Result<Self, CommunityValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CommunityValidationError::Missing { field: "name" });
        }
        if name.chars().count() > COMMUNITY_NAME_MAX {
            return Err(CommunityValidationError::NameTooLong {
                max: COMMUNITY_NAME_MAX,
            });
        }
        let slug = match slug.map(str::trim).filter(|value| !value.is_empty()) {
            Some(explicit) if is_valid_slug(explicit) && explicit.len() <= COMMUNITY_SLUG_MAX => {
                explicit.to_owned()
            }
            Some(_) => return Err(CommunityValidationError::InvalidSlug),
            None => truncate_slug(&slugify(name), COMMUNITY_SLUG_MAX).to_owned(),
        };
        if slug.is_empty() {
            return Err(CommunityValidationError::InvalidSlug);
        }
        Ok(Self {
            name: name.to_owned(),
            slug,
            category,
            description: description.map(str::trim).unwrap_or_default().to_owned(),
            privacy,
        })
    }
}

/// Link between a user and a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMembership {
    /// Community joined.
    pub community_id: CommunityId,
    /// Member.
    pub user_id: UserId,
    /// Whether profile matching created the membership.
    pub auto_assigned: bool,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

/// Post written by a member inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    /// Identifier.
    pub id: PostId,
    /// Owning community.
    pub community_id: CommunityId,
    /// Author.
    pub author_id: UserId,
    /// Body text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Validate post content, returning the trimmed body.
pub fn validate_post_content(raw: &str) -> Result<String, CommunityValidationError> {
    let content = raw.trim();
    let length = content.chars().count();
    if length == 0 || length > POST_CONTENT_MAX {
        return Err(CommunityValidationError::PostContentLength {
            max: POST_CONTENT_MAX,
        });
    }
    Ok(content.to_owned())
}

/// Outcome of reconciling a user's automatic memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSync {
    /// Communities the user was added to.
    pub added: Vec<CommunityId>,
    /// Communities the user was removed from.
    pub removed: Vec<CommunityId>,
}

impl MembershipSync {
    /// Whether the sync changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
