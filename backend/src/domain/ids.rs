//! UUID-backed identifier newtypes.
//!
//! Every aggregate gets its own identifier type so a community id can never
//! be passed where a user id is expected.

use thiserror::Error;

/// Error raised when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a valid UUID")]
pub struct InvalidIdError {
    /// Human-readable name of the identifier kind.
    pub kind: &'static str,
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Parse an identifier from its canonical string form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, $crate::domain::ids::InvalidIdError> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err($crate::domain::ids::InvalidIdError { kind: $kind });
                }
                uuid::Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| $crate::domain::ids::InvalidIdError { kind: $kind })
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::ids::InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_uuid_id!(
    /// Stable user identifier.
    UserId,
    "user id"
);
define_uuid_id!(
    /// Community identifier.
    CommunityId,
    "community id"
);
define_uuid_id!(
    /// Community post identifier.
    PostId,
    "post id"
);
define_uuid_id!(
    /// Donation campaign identifier.
    CampaignId,
    "donation id"
);
define_uuid_id!(
    /// Donation transaction identifier.
    TransactionId,
    "transaction id"
);
define_uuid_id!(
    /// Event identifier.
    EventId,
    "event id"
);
define_uuid_id!(
    /// Opportunity identifier.
    OpportunityId,
    "opportunity id"
);
define_uuid_id!(
    /// Story identifier.
    StoryId,
    "story id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn rejects_malformed_ids(#[case] raw: &str) {
        let err = UserId::new(raw).expect_err("malformed id");
        assert_eq!(err.to_string(), "user id must be a valid UUID");
    }

    #[rstest]
    fn serialises_as_plain_string() {
        let id = CommunityId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        let value = serde_json::to_value(id).expect("serialise");
        assert_eq!(value, serde_json::json!("3fa85f64-5717-4562-b3fc-2c963f66afa6"));
    }
}
