//! Tests for the profile service.

use std::sync::Arc;

use rstest::rstest;
use serde_json::Value;

use super::*;
use crate::domain::ports::{
    MockCommunityPostRepository, MockCommunityRepository, MockProfileRepository,
    MockUserRepository,
};
use crate::domain::profile::test_fixtures::{complete_profile, minimal_profile};
use crate::domain::{
    AcademicInput, ErrorCode, PasswordHash, PersonalInput, ProfileVisibility, Role, User,
};
use crate::test_support::{MutableClock, fixture_now};

/// Community repository double that accepts any synchronisation.
fn permissive_communities() -> MockCommunityRepository {
    let mut communities = MockCommunityRepository::new();
    communities
        .expect_memberships_for_user()
        .returning(|_| Ok(Vec::new()));
    communities.expect_find_by_slug().returning(|_| Ok(None));
    communities.expect_insert().returning(|_| Ok(()));
    communities.expect_add_membership().returning(|_| Ok(true));
    communities
        .expect_remove_membership()
        .returning(|_, _| Ok(true));
    communities
}

fn service_with(
    profiles: MockProfileRepository,
    users: MockUserRepository,
    communities: MockCommunityRepository,
) -> ProfileService {
    let clock = Arc::new(MutableClock::at_fixture_now());
    let community_service = CommunityService::new(
        Arc::new(communities),
        Arc::new(MockCommunityPostRepository::new()),
        clock.clone(),
    );
    ProfileService::new(
        Arc::new(profiles),
        Arc::new(users),
        community_service,
        clock,
    )
}

fn service(profiles: MockProfileRepository) -> ProfileService {
    service_with(profiles, MockUserRepository::new(), permissive_communities())
}

fn valid_input() -> ProfileInput {
    ProfileInput {
        personal: Some(PersonalInput {
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            ..PersonalInput::default()
        }),
        academic: Some(AcademicInput {
            promotion_year: Some(2015),
            faculty: Some("Engineering".to_owned()),
            ..AcademicInput::default()
        }),
        ..ProfileInput::default()
    }
}

fn user_with_email(id: UserId) -> User {
    User {
        id,
        email: Email::new("ada@example.org").expect("valid email"),
        password_hash: PasswordHash::new("hashed"),
        role: Role::Alumni,
        verified: true,
        verification: None,
        created_at: fixture_now(),
    }
}

#[rstest]
#[tokio::test]
async fn create_stores_profile_with_completion() {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(|_| Ok(None));
    profiles
        .expect_insert()
        .withf(|profile| profile.completion.percentage == 25)
        .return_once(|_| Ok(()));

    let user_id = UserId::random();
    let profile = service(profiles)
        .create(&user_id, valid_input())
        .await
        .expect("created");
    assert_eq!(profile.user_id, user_id);
    assert_eq!(profile.created_at, fixture_now());
    assert!(!profile.completion.is_complete);
}

#[rstest]
#[tokio::test]
async fn create_rejects_duplicates() {
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_find_by_user()
        .return_once(|id| Ok(Some(minimal_profile(*id))));
    profiles.expect_insert().never();

    let error = service(profiles)
        .create(&UserId::random(), valid_input())
        .await
        .expect_err("duplicate");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn create_maps_insert_race_to_conflict() {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(|_| Ok(None));
    profiles
        .expect_insert()
        .return_once(|_| Err(ProfileRepositoryError::already_exists()));

    let error = service(profiles)
        .create(&UserId::random(), valid_input())
        .await
        .expect_err("duplicate");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn create_reports_missing_field_name() {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(|_| Ok(None));
    profiles.expect_insert().never();
    let mut input = valid_input();
    input.academic = Some(AcademicInput {
        promotion_year: Some(2015),
        ..AcademicInput::default()
    });

    let error = service(profiles)
        .create(&UserId::random(), input)
        .await
        .expect_err("missing faculty");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    let details = error.details().expect("details");
    assert_eq!(details.get("field"), Some(&Value::from("faculty")));
    assert_eq!(details.get("code"), Some(&Value::from("missing_field")));
}

#[rstest]
#[tokio::test]
async fn update_missing_profile_is_not_found() {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(|_| Ok(None));

    let error = service(profiles)
        .update(&UserId::random(), ProfileInput::default())
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_refreshes_timestamp_and_completion() {
    let clock = Arc::new(MutableClock::at_fixture_now());
    clock.advance_hours(2);
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_find_by_user()
        .return_once(|id| Ok(Some(minimal_profile(*id))));
    profiles.expect_update().return_once(|_| Ok(true));
    let community_service = CommunityService::new(
        Arc::new(permissive_communities()),
        Arc::new(MockCommunityPostRepository::new()),
        clock.clone(),
    );
    let service = ProfileService::new(
        Arc::new(profiles),
        Arc::new(MockUserRepository::new()),
        community_service,
        clock.clone(),
    );
    let patch = ProfileInput {
        personal: Some(PersonalInput {
            first_name: Some("Ada".to_owned()),
            last_name: Some("King".to_owned()),
            bio: Some("Countess".to_owned()),
            ..PersonalInput::default()
        }),
        ..ProfileInput::default()
    };

    let updated = service
        .update(&UserId::random(), patch)
        .await
        .expect("updated");
    assert_eq!(updated.personal.last_name, "King");
    assert_eq!(updated.completion.percentage, 31);
    assert_eq!(updated.updated_at, clock.utc());
    assert_eq!(updated.created_at, fixture_now());
}

#[rstest]
#[tokio::test]
async fn delete_clears_automatic_memberships() {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_delete().return_once(|_| Ok(true));
    let mut communities = MockCommunityRepository::new();
    communities
        .expect_memberships_for_user()
        .times(1)
        .returning(|_| Ok(Vec::new()));

    service_with(profiles, MockUserRepository::new(), communities)
        .delete(&UserId::random())
        .await
        .expect("deleted");
}

#[rstest]
#[case(ProfileVisibility::Private, Viewer::Anonymous, ErrorCode::Forbidden)]
#[case(ProfileVisibility::AlumniOnly, Viewer::Anonymous, ErrorCode::Unauthorized)]
#[tokio::test]
async fn public_view_enforces_visibility(
    #[case] visibility: ProfileVisibility,
    #[case] viewer: Viewer,
    #[case] expected: ErrorCode,
) {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(move |id| {
        let mut profile = complete_profile(*id);
        profile.privacy.profile_visibility = visibility;
        Ok(Some(profile))
    });

    let error = service(profiles)
        .public_view(&UserId::random(), &viewer)
        .await
        .expect_err("hidden");
    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn public_view_includes_email_only_when_shown() {
    let target = UserId::random();
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_user().return_once(|id| {
        let mut profile = complete_profile(*id);
        profile.privacy.profile_visibility = ProfileVisibility::Public;
        profile.privacy.show_email = true;
        Ok(Some(profile))
    });
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|id| Ok(Some(user_with_email(*id))));

    let view = service_with(profiles, users, permissive_communities())
        .public_view(&target, &Viewer::Anonymous)
        .await
        .expect("visible");
    let ProfileView::Filtered(public) = view else {
        panic!("anonymous viewers get the filtered view");
    };
    assert_eq!(public.email.as_deref(), Some("ada@example.org"));
    assert!(public.phone.is_none());
}

#[rstest]
#[tokio::test]
async fn directory_limits_visibilities_for_anonymous_viewers() {
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_search()
        .withf(|search| {
            search.visibilities == vec![ProfileVisibility::Public] && search.limit == 21
        })
        .return_once(|_| Ok(vec![complete_profile(UserId::random())]));
    let mut users = MockUserRepository::new();
    users.expect_find_many().never();

    let page = service_with(profiles, users, permissive_communities())
        .directory(
            &Viewer::Anonymous,
            DirectoryFilter::default(),
            &PageRequest::default(),
        )
        .await
        .expect("listed");
    assert_eq!(page.data.len(), 1);
    assert!(page.next_cursor.is_none());
    assert!(page.data.first().is_some_and(|view| view.email.is_none()));
}
