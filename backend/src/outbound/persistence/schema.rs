//! Diesel table definitions.
//!
//! Must match `backend/migrations` exactly.

diesel::table! {
    /// Portal accounts. `verification_token_digest` holds a SHA-256 digest,
    /// never the token itself.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        role -> Varchar,
        verified -> Bool,
        verification_token_digest -> Nullable<Text>,
        verification_expires_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One profile per user. Sections live in `document`; the `*_key`
    /// columns are trimmed lower-case copies used by directory filters.
    alumni_profiles (user_id) {
        user_id -> Uuid,
        visibility -> Varchar,
        promotion_year -> Int4,
        faculty_key -> Text,
        country_key -> Nullable<Text>,
        profession_key -> Nullable<Text>,
        document -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    communities (id) {
        id -> Uuid,
        name -> Varchar,
        slug -> Varchar,
        category -> Varchar,
        description -> Text,
        privacy -> Varchar,
        member_count -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    community_memberships (community_id, user_id) {
        community_id -> Uuid,
        user_id -> Uuid,
        auto_assigned -> Bool,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    community_posts (id) {
        id -> Uuid,
        community_id -> Uuid,
        author_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Amounts are minor currency units.
    donation_campaigns (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        target_amount -> Int8,
        current_amount -> Int8,
        currency -> Varchar,
        status -> Varchar,
        deadline -> Nullable<Timestamptz>,
        created_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    donation_transactions (id) {
        id -> Uuid,
        donation_id -> Uuid,
        user_id -> Nullable<Uuid>,
        amount -> Int8,
        currency -> Varchar,
        status -> Varchar,
        provider_reference -> Varchar,
        checkout_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    events (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        location -> Varchar,
        starts_at -> Timestamptz,
        ends_at -> Nullable<Timestamptz>,
        author_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    opportunities (id) {
        id -> Uuid,
        title -> Varchar,
        organization -> Varchar,
        kind -> Varchar,
        description -> Text,
        location -> Varchar,
        apply_url -> Nullable<Text>,
        expires_at -> Nullable<Timestamptz>,
        author_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    stories (id) {
        id -> Uuid,
        title -> Varchar,
        body -> Text,
        author_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(alumni_profiles -> users (user_id));
diesel::joinable!(community_memberships -> communities (community_id));
diesel::joinable!(community_posts -> communities (community_id));
diesel::joinable!(donation_transactions -> donation_campaigns (donation_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    alumni_profiles,
    communities,
    community_memberships,
    community_posts,
    donation_campaigns,
    donation_transactions,
    events,
    opportunities,
    stories,
);
