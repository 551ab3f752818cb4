//! PostgreSQL-backed `ProfileRepository`.
//!
//! Profile sections are stored as one JSONB document. Directory filters run
//! against denormalised, lower-cased key columns written alongside it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError, ProfileSearch};
use crate::domain::{AlumniProfile, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound, unique_violation};
use super::models::ProfileRow;
use super::pool::{DbPool, PoolError};
use super::schema::alumni_profiles;

/// Diesel-backed profile store.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ProfileRepositoryError {
    map_pool_error(error, ProfileRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ProfileRepositoryError {
    if unique_violation(&error).is_some() {
        return ProfileRepositoryError::already_exists();
    }
    map_diesel_error(
        error,
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

fn filter_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn to_row(profile: &AlumniProfile) -> Result<ProfileRow, ProfileRepositoryError> {
    let document = serde_json::to_value(profile)
        .map_err(|error| ProfileRepositoryError::serialization(error.to_string()))?;
    Ok(ProfileRow {
        user_id: *profile.user_id.as_uuid(),
        visibility: profile.privacy.profile_visibility.as_str().to_owned(),
        promotion_year: profile.academic.promotion_year,
        faculty_key: filter_key(&profile.academic.faculty),
        country_key: profile.contact.country.as_deref().map(filter_key),
        profession_key: profile.professional.profession.as_deref().map(filter_key),
        document,
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    })
}

fn from_row(row: ProfileRow) -> Result<AlumniProfile, ProfileRepositoryError> {
    let mut profile: AlumniProfile = serde_json::from_value(row.document)
        .map_err(|error| ProfileRepositoryError::serialization(error.to_string()))?;
    profile.user_id = UserId::from_uuid(row.user_id);
    profile.created_at = row.created_at;
    profile.updated_at = row.updated_at;
    Ok(profile)
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn insert(&self, profile: &AlumniProfile) -> Result<(), ProfileRepositoryError> {
        let row = to_row(profile)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(alumni_profiles::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AlumniProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        alumni_profiles::table
            .find(user_id.as_uuid())
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn update(&self, profile: &AlumniProfile) -> Result<bool, ProfileRepositoryError> {
        let row = to_row(profile)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::update(alumni_profiles::table.find(profile.user_id.as_uuid()))
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::delete(alumni_profiles::table.find(user_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }

    async fn search(
        &self,
        search: &ProfileSearch,
    ) -> Result<Vec<AlumniProfile>, ProfileRepositoryError> {
        if search.visibilities.is_empty() {
            return Ok(Vec::new());
        }
        let visibilities: Vec<&str> = search
            .visibilities
            .iter()
            .map(|visibility| visibility.as_str())
            .collect();

        let mut query = alumni_profiles::table
            .filter(alumni_profiles::visibility.eq_any(visibilities))
            .select(ProfileRow::as_select())
            .into_boxed();
        if let Some(year) = search.filter.promotion_year {
            query = query.filter(alumni_profiles::promotion_year.eq(year));
        }
        if let Some(faculty) = &search.filter.faculty {
            query = query.filter(alumni_profiles::faculty_key.eq(filter_key(faculty)));
        }
        if let Some(country) = &search.filter.country {
            query = query.filter(alumni_profiles::country_key.eq(filter_key(country)));
        }
        if let Some(profession) = &search.filter.profession {
            query = query.filter(alumni_profiles::profession_key.eq(filter_key(profession)));
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = query
            .order((alumni_profiles::created_at.asc(), alumni_profiles::user_id.asc()))
            .offset(sql_bound(search.offset))
            .limit(sql_bound(search.limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::test_fixtures::complete_profile;
    use rstest::rstest;

    #[rstest]
    fn rows_index_directory_fields_case_insensitively() {
        let mut profile = complete_profile(UserId::random());
        profile.academic.faculty = "  Engineering ".to_owned();
        profile.contact.country = Some("France".to_owned());

        let row = to_row(&profile).expect("row");

        assert_eq!(row.faculty_key, "engineering");
        assert_eq!(row.country_key.as_deref(), Some("france"));
        assert_eq!(row.visibility, "alumni_only");
    }

    #[rstest]
    fn key_columns_win_over_the_document() {
        let profile = complete_profile(UserId::random());
        let mut row = to_row(&profile).expect("row");
        let owner = uuid::Uuid::new_v4();
        row.user_id = owner;

        let restored = from_row(row).expect("profile");

        assert_eq!(restored.user_id, UserId::from_uuid(owner));
        assert_eq!(restored.personal, profile.personal);
    }

    #[rstest]
    fn corrupt_documents_surface_as_serialization_errors() {
        let mut row = to_row(&complete_profile(UserId::random())).expect("row");
        row.document = serde_json::json!({"personal": 3});
        let error = from_row(row).expect_err("corrupt");
        assert!(matches!(error, ProfileRepositoryError::Serialization { .. }));
    }
}
