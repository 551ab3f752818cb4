//! Profile completion scoring.
//!
//! Sixteen tracked fields carry equal weight. A text field counts when it is
//! non-blank after trimming; `skills` counts when it has at least one entry.

use serde::{Deserialize, Serialize};

use super::AlumniProfile;

/// Tracked fields, in reporting order.
pub const TRACKED_FIELDS: [&str; 16] = [
    "firstName",
    "lastName",
    "bio",
    "photoUrl",
    "promotionYear",
    "faculty",
    "department",
    "degree",
    "currentPosition",
    "company",
    "profession",
    "skills",
    "phone",
    "city",
    "country",
    "linkedinUrl",
];

/// Derived completion status stored alongside the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    /// Filled share of tracked fields, rounded down.
    pub percentage: u8,
    /// Unfilled tracked fields, in [`TRACKED_FIELDS`] order.
    pub missing_fields: Vec<String>,
    /// Whether every tracked field is filled.
    pub is_complete: bool,
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

fn field_presence(profile: &AlumniProfile) -> [bool; 16] {
    let personal = &profile.personal;
    let academic = &profile.academic;
    let professional = &profile.professional;
    let contact = &profile.contact;
    [
        filled(Some(&personal.first_name)),
        filled(Some(&personal.last_name)),
        filled(personal.bio.as_deref()),
        filled(personal.photo_url.as_deref()),
        academic.promotion_year > 0,
        filled(Some(&academic.faculty)),
        filled(academic.department.as_deref()),
        filled(academic.degree.as_deref()),
        filled(professional.current_position.as_deref()),
        filled(professional.company.as_deref()),
        filled(professional.profession.as_deref()),
        professional
            .skills
            .iter()
            .any(|skill| !skill.trim().is_empty()),
        filled(contact.phone.as_deref()),
        filled(contact.city.as_deref()),
        filled(contact.country.as_deref()),
        filled(contact.linkedin_url.as_deref()),
    ]
}

/// Compute completion for `profile`. Ignores the stored status.
pub fn compute_completion(profile: &AlumniProfile) -> CompletionStatus {
    let presence = field_presence(profile);
    let filled_count = presence.iter().filter(|present| **present).count();
    let missing_fields = TRACKED_FIELDS
        .iter()
        .zip(presence)
        .filter(|(_, present)| !present)
        .map(|(field, _)| (*field).to_owned())
        .collect();
    let percentage = u8::try_from(filled_count * 100 / TRACKED_FIELDS.len()).unwrap_or(100);
    CompletionStatus {
        percentage,
        missing_fields,
        is_complete: percentage == 100,
    }
}
