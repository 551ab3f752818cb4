//! Match a profile to the communities it should automatically belong to.

use crate::domain::AlumniProfile;
use crate::domain::slug::{slugify, truncate_slug};

use super::{COMMUNITY_NAME_MAX, COMMUNITY_SLUG_MAX, CommunityCategory};

/// Community a profile should be a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityTarget {
    /// Grouping attribute.
    pub category: CommunityCategory,
    /// Unique key used to find or create the community.
    pub slug: String,
    /// Display name used when the community has to be created.
    pub name: String,
}

impl CommunityTarget {
    fn from_text(category: CommunityCategory, label: &str, value: Option<&str>) -> Option<Self> {
        let value = value?.trim();
        let suffix = slugify(value);
        if suffix.is_empty() {
            return None;
        }
        let slug = format!("{}-{suffix}", category.as_str());
        let name = format!("{label} {value}");
        Some(Self {
            category,
            slug: truncate_slug(&slug, COMMUNITY_SLUG_MAX).to_owned(),
            name: truncate_chars(&name, COMMUNITY_NAME_MAX).trim_end().to_owned(),
        })
    }
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((end, _)) => value.get(..end).unwrap_or(value),
        None => value,
    }
}

/// Targets for `profile`, in category order.
///
/// Returns nothing when `autoJoin` is disabled; excluded categories are
/// skipped, as are attributes whose slug would be empty.
///
/// # Examples
/// ```
/// # use backend::domain::{AlumniProfile, match_communities};
/// # fn demo(profile: &AlumniProfile) {
/// for target in match_communities(profile) {
///     println!("{} -> {}", target.slug, target.name);
/// }
/// # }
/// ```
pub fn match_communities(profile: &AlumniProfile) -> Vec<CommunityTarget> {
    let preferences = &profile.community_preferences;
    if !preferences.auto_join {
        return Vec::new();
    }

    let year = profile.academic.promotion_year;
    let promotion = (year > 0).then(|| CommunityTarget {
        category: CommunityCategory::Promotion,
        slug: format!("promotion-{year}"),
        name: format!("Promotion {year}"),
    });

    [
        promotion,
        CommunityTarget::from_text(
            CommunityCategory::Faculty,
            "Faculty of",
            Some(profile.academic.faculty.as_str()),
        ),
        CommunityTarget::from_text(
            CommunityCategory::Department,
            "Department of",
            profile.academic.department.as_deref(),
        ),
        CommunityTarget::from_text(
            CommunityCategory::Region,
            "Alumni in",
            profile.contact.country.as_deref(),
        ),
        CommunityTarget::from_text(
            CommunityCategory::Profession,
            "Profession:",
            profile.professional.profession.as_deref(),
        ),
    ]
    .into_iter()
    .flatten()
    .filter(|target| !preferences.excluded_categories.contains(&target.category))
    .collect()
}
