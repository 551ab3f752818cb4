//! Privacy filtering of profiles for other viewers.
//!
//! Owners and administrators always see the stored profile. Everyone else is
//! gated by `profileVisibility` and then sees a [`PublicProfile`] built from
//! the `show*` switches. Date of birth and gender never leave this filter.

use serde::Serialize;
use thiserror::Error;

use super::{AcademicInfo, AlumniProfile, ProfessionalInfo, ProfileVisibility};
use crate::domain::{Actor, Email, Role, UserId};

/// Who is asking to see a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// No session.
    Anonymous,
    /// Signed-in user.
    User { id: UserId, role: Role },
}

impl From<Actor> for Viewer {
    fn from(actor: Actor) -> Self {
        Self::User {
            id: actor.id,
            role: actor.role,
        }
    }
}

impl Viewer {
    /// Signed-in user's id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    /// Whether the viewer is an administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User { role, .. } if role.is_admin())
    }

    /// Profile visibilities this viewer may list in the directory.
    pub fn listable_visibilities(&self) -> &'static [ProfileVisibility] {
        match self {
            Self::Anonymous => &[ProfileVisibility::Public],
            Self::User { role, .. } if role.is_admin() => &[
                ProfileVisibility::Public,
                ProfileVisibility::AlumniOnly,
                ProfileVisibility::Private,
            ],
            Self::User { .. } => &[ProfileVisibility::Public, ProfileVisibility::AlumniOnly],
        }
    }
}

/// Why a viewer may not see a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VisibilityError {
    /// The profile is limited to signed-in alumni.
    #[error("sign in to view this profile")]
    SignInRequired,
    /// The profile is private.
    #[error("this profile is private")]
    Private,
}

/// How much of a profile a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAccess {
    /// The stored profile, unfiltered.
    Full,
    /// The privacy-filtered view.
    Filtered,
}

/// Decide the access level for `viewer` on `profile`.
pub fn access_for(profile: &AlumniProfile, viewer: &Viewer) -> Result<ProfileAccess, VisibilityError> {
    if viewer.is_admin() || viewer.user_id() == Some(profile.user_id) {
        return Ok(ProfileAccess::Full);
    }
    match (profile.privacy.profile_visibility, viewer) {
        (ProfileVisibility::Private, _) => Err(VisibilityError::Private),
        (ProfileVisibility::AlumniOnly, Viewer::Anonymous) => Err(VisibilityError::SignInRequired),
        (ProfileVisibility::AlumniOnly | ProfileVisibility::Public, _) => {
            Ok(ProfileAccess::Filtered)
        }
    }
}

/// Privacy-filtered profile shown to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub completion_percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic: Option<AcademicInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional: Option<ProfessionalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PublicProfile {
    /// Build the filtered view. `email` is the owner's account email and is
    /// only included when `showEmail` is set.
    pub fn from_profile(profile: &AlumniProfile, email: Option<&Email>) -> Self {
        let privacy = &profile.privacy;
        let contact = &profile.contact;
        let (city, country) = if privacy.show_location {
            (contact.city.clone(), contact.country.clone())
        } else {
            (None, None)
        };
        let (linkedin_url, website_url) = if privacy.show_social_links {
            (contact.linkedin_url.clone(), contact.website_url.clone())
        } else {
            (None, None)
        };
        Self {
            user_id: profile.user_id,
            first_name: profile.personal.first_name.clone(),
            last_name: profile.personal.last_name.clone(),
            photo_url: profile.personal.photo_url.clone(),
            bio: profile.personal.bio.clone(),
            completion_percentage: profile.completion.percentage,
            academic: privacy.show_academic.then(|| profile.academic.clone()),
            professional: privacy
                .show_professional
                .then(|| profile.professional.clone()),
            city,
            country,
            linkedin_url,
            website_url,
            email: email
                .filter(|_| privacy.show_email)
                .map(|address| address.as_ref().to_owned()),
            phone: contact.phone.clone().filter(|_| privacy.show_phone),
        }
    }
}

/// Profile as returned to a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    /// Owner or administrator view.
    Full(Box<AlumniProfile>),
    /// Everyone else.
    Filtered(PublicProfile),
}
