//! Alumni profiles: sections, validation, and derived completion status.
//!
//! A profile is one-to-one with a [`crate::domain::User`]. Completion is
//! recomputed from content on every write ([`completion`]) and public views
//! are produced by the privacy filter in [`visibility`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CommunityCategory, UserId};

pub mod completion;
pub mod visibility;

pub use completion::{CompletionStatus, TRACKED_FIELDS, compute_completion};
pub use visibility::{ProfileAccess, ProfileView, PublicProfile, Viewer, VisibilityError};

/// Earliest accepted promotion year.
pub const PROMOTION_YEAR_MIN: i32 = 1950;
/// How far past the current year a promotion year may lie.
pub const PROMOTION_YEAR_LOOKAHEAD: i32 = 6;
/// Maximum length of any free-text profile field.
pub const TEXT_FIELD_MAX: usize = 2000;

/// Who may see a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVisibility {
    /// Anyone, including anonymous visitors.
    Public,
    /// Signed-in users only.
    #[default]
    AlumniOnly,
    /// The owner and administrators only.
    Private,
}

impl ProfileVisibility {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::AlumniOnly => "alumni_only",
            Self::Private => "private",
        }
    }
}

/// Personal details. `first_name` and `last_name` are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Academic history. `promotion_year` and `faculty` are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicInfo {
    pub promotion_year: i32,
    pub faculty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
}

/// Current professional situation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Contact and location details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

/// Controls automatic community assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPreferences {
    #[serde(default = "default_true")]
    pub auto_join: bool,
    #[serde(default)]
    pub excluded_categories: Vec<CommunityCategory>,
}

impl Default for CommunityPreferences {
    fn default() -> Self {
        Self {
            auto_join: true,
            excluded_categories: Vec::new(),
        }
    }
}

/// Privacy switches applied when other users view the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    #[serde(default)]
    pub profile_visibility: ProfileVisibility,
    #[serde(default)]
    pub show_email: bool,
    #[serde(default)]
    pub show_phone: bool,
    #[serde(default = "default_true")]
    pub show_academic: bool,
    #[serde(default = "default_true")]
    pub show_professional: bool,
    #[serde(default = "default_true")]
    pub show_location: bool,
    #[serde(default = "default_true")]
    pub show_social_links: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::default(),
            show_email: false,
            show_phone: false,
            show_academic: true,
            show_professional: true,
            show_location: true,
            show_social_links: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Stored alumni profile.
///
/// ## Invariants
/// - `completion` always equals [`compute_completion`] of the content.
/// - Required fields (`firstName`, `lastName`, `promotionYear`, `faculty`)
///   are non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniProfile {
    pub user_id: UserId,
    pub personal: PersonalInfo,
    pub academic: AcademicInfo,
    pub professional: ProfessionalInfo,
    pub contact: ContactInfo,
    pub community_preferences: CommunityPreferences,
    pub privacy: PrivacySettings,
    pub completion: CompletionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlumniProfile {
    /// Recompute the derived completion status from current content.
    pub fn refresh_completion(&mut self) {
        self.completion = compute_completion(self);
    }
}

/// Raw personal section as submitted by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

/// Raw academic section as submitted by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicInput {
    pub promotion_year: Option<i32>,
    pub faculty: Option<String>,
    pub department: Option<String>,
    pub degree: Option<String>,
}

/// Profile payload used for both creation and partial updates.
///
/// On update, each present section replaces the stored section wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub personal: Option<PersonalInput>,
    pub academic: Option<AcademicInput>,
    pub professional: Option<ProfessionalInfo>,
    pub contact: Option<ContactInfo>,
    pub community_preferences: Option<CommunityPreferences>,
    pub privacy: Option<PrivacySettings>,
}

/// Field-level profile validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileValidationError {
    /// A required field was absent or blank.
    #[error("{field} is required")]
    MissingField { field: &'static str },
    /// A field was present but invalid.
    #[error("{field} {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl ProfileValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => field,
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ProfileValidationError> {
    let text = optional_text(value, field)?;
    text.ok_or(ProfileValidationError::MissingField { field })
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ProfileValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > TEXT_FIELD_MAX {
        return Err(ProfileValidationError::InvalidField {
            field,
            reason: format!("must be at most {TEXT_FIELD_MAX} characters"),
        });
    }
    Ok(Some(trimmed.to_owned()))
}

fn optional_url(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ProfileValidationError> {
    let url = optional_text(value, field)?;
    match url {
        Some(ref candidate)
            if !(candidate.starts_with("http://") || candidate.starts_with("https://")) =>
        {
            Err(ProfileValidationError::InvalidField {
                field,
                reason: "must start with http:// or https://".to_owned(),
            })
        }
        other => Ok(other),
    }
}

impl PersonalInput {
    /// Validate into a stored personal section.
    pub fn validate(self) -> Result<PersonalInfo, ProfileValidationError> {
        Ok(PersonalInfo {
            first_name: required_text(self.first_name, "firstName")?,
            last_name: required_text(self.last_name, "lastName")?,
            gender: optional_text(self.gender, "gender")?,
            date_of_birth: self.date_of_birth,
            bio: optional_text(self.bio, "bio")?,
            photo_url: optional_url(self.photo_url, "photoUrl")?,
        })
    }
}

impl AcademicInput {
    /// Validate into a stored academic section.
    ///
    /// `current_year` bounds the promotion year from above.
    pub fn validate(self, current_year: i32) -> Result<AcademicInfo, ProfileValidationError> {
        let promotion_year = self.promotion_year.ok_or(ProfileValidationError::MissingField {
            field: "promotionYear",
        })?;
        let max_year = current_year + PROMOTION_YEAR_LOOKAHEAD;
        if !(PROMOTION_YEAR_MIN..=max_year).contains(&promotion_year) {
            return Err(ProfileValidationError::InvalidField {
                field: "promotionYear",
                reason: format!("must be between {PROMOTION_YEAR_MIN} and {max_year}"),
            });
        }
        Ok(AcademicInfo {
            promotion_year,
            faculty: required_text(self.faculty, "faculty")?,
            department: optional_text(self.department, "department")?,
            degree: optional_text(self.degree, "degree")?,
        })
    }
}

/// Normalise the professional section: trim text, drop blank skills.
pub fn normalize_professional(
    section: ProfessionalInfo,
) -> Result<ProfessionalInfo, ProfileValidationError> {
    Ok(ProfessionalInfo {
        current_position: optional_text(section.current_position, "currentPosition")?,
        company: optional_text(section.company, "company")?,
        profession: optional_text(section.profession, "profession")?,
        skills: section
            .skills
            .into_iter()
            .map(|skill| skill.trim().to_owned())
            .filter(|skill| !skill.is_empty())
            .collect(),
    })
}

/// Normalise the contact section and check URL shapes.
pub fn normalize_contact(section: ContactInfo) -> Result<ContactInfo, ProfileValidationError> {
    Ok(ContactInfo {
        phone: optional_text(section.phone, "phone")?,
        city: optional_text(section.city, "city")?,
        country: optional_text(section.country, "country")?,
        linkedin_url: optional_url(section.linkedin_url, "linkedinUrl")?,
        website_url: optional_url(section.website_url, "websiteUrl")?,
    })
}

/// Fully validated sections for a new profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProfile {
    pub personal: PersonalInfo,
    pub academic: AcademicInfo,
    pub professional: ProfessionalInfo,
    pub contact: ContactInfo,
    pub community_preferences: CommunityPreferences,
    pub privacy: PrivacySettings,
}

impl ProfileInput {
    /// Validate a creation payload. Personal and academic sections are
    /// required; missing optional sections take their defaults.
    pub fn validate_new(self, current_year: i32) -> Result<ValidatedProfile, ProfileValidationError> {
        let personal = self
            .personal
            .ok_or(ProfileValidationError::MissingField { field: "firstName" })?
            .validate()?;
        let academic = self
            .academic
            .ok_or(ProfileValidationError::MissingField {
                field: "promotionYear",
            })?
            .validate(current_year)?;
        Ok(ValidatedProfile {
            personal,
            academic,
            professional: normalize_professional(self.professional.unwrap_or_default())?,
            contact: normalize_contact(self.contact.unwrap_or_default())?,
            community_preferences: self.community_preferences.unwrap_or_default(),
            privacy: self.privacy.unwrap_or_default(),
        })
    }

    /// Apply present sections to `profile`, validating each one first.
    ///
    /// Nothing is written to `profile` unless every section validates.
    pub fn apply_to(
        self,
        profile: &mut AlumniProfile,
        current_year: i32,
    ) -> Result<(), ProfileValidationError> {
        let personal = self.personal.map(PersonalInput::validate).transpose()?;
        let academic = self
            .academic
            .map(|section| section.validate(current_year))
            .transpose()?;
        let professional = self.professional.map(normalize_professional).transpose()?;
        let contact = self.contact.map(normalize_contact).transpose()?;

        if let Some(section) = personal {
            profile.personal = section;
        }
        if let Some(section) = academic {
            profile.academic = section;
        }
        if let Some(section) = professional {
            profile.professional = section;
        }
        if let Some(section) = contact {
            profile.contact = section;
        }
        if let Some(section) = self.community_preferences {
            profile.community_preferences = section;
        }
        if let Some(section) = self.privacy {
            profile.privacy = section;
        }
        profile.refresh_completion();
        Ok(())
    }
}

impl ValidatedProfile {
    /// Build the stored profile, computing completion.
    pub fn into_profile(self, user_id: UserId, now: DateTime<Utc>) -> AlumniProfile {
        let mut profile = AlumniProfile {
            user_id,
            personal: self.personal,
            academic: self.academic,
            professional: self.professional,
            contact: self.contact,
            community_preferences: self.community_preferences,
            privacy: self.privacy,
            completion: CompletionStatus::default(),
            created_at: now,
            updated_at: now,
        };
        profile.refresh_completion();
        profile
    }
}

/// Equality filters for the alumni directory. Text filters compare
/// case-insensitively after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    pub promotion_year: Option<i32>,
    pub faculty: Option<String>,
    pub country: Option<String>,
    pub profession: Option<String>,
}

impl DirectoryFilter {
    /// Whether `profile` satisfies every present filter.
    pub fn matches(&self, profile: &AlumniProfile) -> bool {
        fn text_matches(filter: Option<&String>, value: Option<&str>) -> bool {
            filter.is_none_or(|wanted| {
                value.is_some_and(|actual| actual.trim().eq_ignore_ascii_case(wanted.trim()))
            })
        }

        self.promotion_year
            .is_none_or(|year| profile.academic.promotion_year == year)
            && text_matches(self.faculty.as_ref(), Some(profile.academic.faculty.as_str()))
            && text_matches(self.country.as_ref(), profile.contact.country.as_deref())
            && text_matches(
                self.profession.as_ref(),
                profile.professional.profession.as_deref(),
            )
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::{complete_profile, minimal_profile};
    use super::*;
    use rstest::rstest;

    fn personal(first: Option<&str>, last: Option<&str>) -> PersonalInput {
        PersonalInput {
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            ..PersonalInput::default()
        }
    }

    fn academic(year: Option<i32>, faculty: Option<&str>) -> AcademicInput {
        AcademicInput {
            promotion_year: year,
            faculty: faculty.map(str::to_owned),
            ..AcademicInput::default()
        }
    }

    #[rstest]
    #[case(None, Some("Lovelace"), "firstName")]
    #[case(Some("  "), Some("Lovelace"), "firstName")]
    #[case(Some("Ada"), None, "lastName")]
    fn personal_requires_names(
        #[case] first: Option<&str>,
        #[case] last: Option<&str>,
        #[case] field: &str,
    ) {
        let err = personal(first, last).validate().expect_err("missing name");
        assert_eq!(err.field(), field);
        assert_eq!(err.code(), "missing_field");
    }

    #[rstest]
    #[case(None, Some("Engineering"), "promotionYear", "missing_field")]
    #[case(Some(1949), Some("Engineering"), "promotionYear", "invalid_field")]
    #[case(Some(2033), Some("Engineering"), "promotionYear", "invalid_field")]
    #[case(Some(2015), Some(""), "faculty", "missing_field")]
    fn academic_validates_required_fields(
        #[case] year: Option<i32>,
        #[case] faculty: Option<&str>,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let err = academic(year, faculty)
            .validate(2026)
            .expect_err("invalid academic section");
        assert_eq!((err.field(), err.code()), (field, code));
    }

    #[rstest]
    fn academic_accepts_lookahead_year() {
        let section = academic(Some(2032), Some(" Engineering "))
            .validate(2026)
            .expect("valid");
        assert_eq!(section.faculty, "Engineering");
    }

    #[rstest]
    fn create_requires_personal_section() {
        let input = ProfileInput {
            academic: Some(academic(Some(2015), Some("Engineering"))),
            ..ProfileInput::default()
        };
        let err = input.validate_new(2026).expect_err("missing personal");
        assert_eq!(err.field(), "firstName");
    }

    #[rstest]
    fn create_requires_academic_section() {
        let input = ProfileInput {
            personal: Some(personal(Some("Ada"), Some("Lovelace"))),
            ..ProfileInput::default()
        };
        let err = input.validate_new(2026).expect_err("missing academic");
        assert_eq!(err.field(), "promotionYear");
    }

    #[rstest]
    #[case("ftp://example.org")]
    #[case("example.org")]
    fn urls_must_use_http(#[case] url: &str) {
        let contact = ContactInfo {
            linkedin_url: Some(url.to_owned()),
            ..ContactInfo::default()
        };
        let err = normalize_contact(contact).expect_err("invalid url");
        assert_eq!(err.field(), "linkedinUrl");
    }

    #[rstest]
    fn blank_optional_fields_become_none() {
        let professional = normalize_professional(ProfessionalInfo {
            company: Some("   ".to_owned()),
            skills: vec![" Rust ".to_owned(), " ".to_owned()],
            ..ProfessionalInfo::default()
        })
        .expect("valid");
        assert_eq!(professional.company, None);
        assert_eq!(professional.skills, vec!["Rust".to_owned()]);
    }

    #[rstest]
    fn apply_leaves_profile_untouched_on_error() {
        let mut profile = minimal_profile(UserId::random());
        let before = profile.clone();
        let patch = ProfileInput {
            contact: Some(ContactInfo {
                city: Some("Lyon".to_owned()),
                ..ContactInfo::default()
            }),
            personal: Some(personal(Some(""), Some("Lovelace"))),
            ..ProfileInput::default()
        };
        assert!(patch.apply_to(&mut profile, 2026).is_err());
        assert_eq!(profile, before);
    }

    #[rstest]
    fn apply_replaces_sections_and_refreshes_completion() {
        let mut profile = minimal_profile(UserId::random());
        let before = profile.completion.percentage;
        let patch = ProfileInput {
            contact: Some(ContactInfo {
                city: Some("Lyon".to_owned()),
                ..ContactInfo::default()
            }),
            ..ProfileInput::default()
        };
        patch.apply_to(&mut profile, 2026).expect("valid patch");
        assert_eq!(profile.contact.city.as_deref(), Some("Lyon"));
        assert!(profile.completion.percentage > before);
    }

    #[rstest]
    #[case(DirectoryFilter { promotion_year: Some(2015), ..DirectoryFilter::default() }, true)]
    #[case(DirectoryFilter { promotion_year: Some(2016), ..DirectoryFilter::default() }, false)]
    #[case(DirectoryFilter { country: Some(" FRANCE ".to_owned()), ..DirectoryFilter::default() }, true)]
    #[case(DirectoryFilter { faculty: Some("law".to_owned()), ..DirectoryFilter::default() }, false)]
    #[case(DirectoryFilter { profession: Some("software engineering".to_owned()), ..DirectoryFilter::default() }, true)]
    fn directory_filter_matches_case_insensitively(
        #[case] filter: DirectoryFilter,
        #[case] expected: bool,
    ) {
        let profile = complete_profile(UserId::random());
        assert_eq!(filter.matches(&profile), expected);
    }

    #[rstest]
    fn privacy_defaults_follow_documented_values() {
        let privacy: PrivacySettings = serde_json::from_str("{}").expect("defaults");
        assert_eq!(privacy, PrivacySettings::default());
        assert_eq!(privacy.profile_visibility, ProfileVisibility::AlumniOnly);
        assert!(!privacy.show_email);
        assert!(privacy.show_academic);
    }
}
