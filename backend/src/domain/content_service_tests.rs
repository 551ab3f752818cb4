//! Tests for the authored content service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockall::mock;
use rstest::rstest;
use serde_json::Value;

use super::*;
use crate::domain::{
    ErrorCode, EventId, EventInput, Role, StoryId, StoryInput, UserId,
};
use crate::test_support::{MutableClock, fixture_now};

mock! {
    Events {}

    #[async_trait]
    impl ContentRepository<Event> for Events {
        async fn insert(&self, record: &Event) -> Result<(), ContentRepositoryError>;
        async fn find(&self, id: &EventId) -> Result<Option<Event>, ContentRepositoryError>;
        async fn update(&self, record: &Event) -> Result<bool, ContentRepositoryError>;
        async fn delete(&self, id: &EventId) -> Result<bool, ContentRepositoryError>;
        async fn list(&self, query: &ContentListQuery) -> Result<Vec<Event>, ContentRepositoryError>;
    }
}

mock! {
    Stories {}

    #[async_trait]
    impl ContentRepository<Story> for Stories {
        async fn insert(&self, record: &Story) -> Result<(), ContentRepositoryError>;
        async fn find(&self, id: &StoryId) -> Result<Option<Story>, ContentRepositoryError>;
        async fn update(&self, record: &Story) -> Result<bool, ContentRepositoryError>;
        async fn delete(&self, id: &StoryId) -> Result<bool, ContentRepositoryError>;
        async fn list(&self, query: &ContentListQuery) -> Result<Vec<Story>, ContentRepositoryError>;
    }
}

fn events(repo: MockEvents) -> EventService {
    ContentService::new(Arc::new(repo), Arc::new(MutableClock::at_fixture_now()))
}

fn stories(repo: MockStories) -> StoryService {
    ContentService::new(Arc::new(repo), Arc::new(MutableClock::at_fixture_now()))
}

fn actor(role: Role) -> Actor {
    Actor {
        id: UserId::random(),
        role,
    }
}

fn story_by(author_id: UserId) -> Story {
    Story {
        id: StoryId::random(),
        title: "From campus to orbit".to_owned(),
        body: "It started in the lab.".to_owned(),
        author_id,
        created_at: fixture_now(),
    }
}

fn story_draft() -> crate::domain::StoryDraft {
    StoryInput {
        title: Some("Rewritten".to_owned()),
        body: Some("New body".to_owned()),
    }
    .validate()
    .expect("valid story")
}

#[rstest]
#[tokio::test]
async fn create_stamps_author_and_time() {
    let mut repo = MockEvents::new();
    repo.expect_insert().times(1).returning(|_| Ok(()));
    let author = actor(Role::Alumni);
    let draft = EventInput {
        title: Some("Reunion gala".to_owned()),
        starts_at: Some(fixture_now() + Duration::days(30)),
        ..EventInput::default()
    }
    .validate()
    .expect("valid event");

    let event = events(repo).create(&author, draft).await.expect("created");
    assert_eq!(event.author_id, author.id);
    assert_eq!(event.created_at, fixture_now());
    assert_eq!(event.title, "Reunion gala");
}

#[rstest]
#[case(true, Some(fixture_now()))]
#[case(false, None)]
#[tokio::test]
async fn list_passes_upcoming_cutoff(
    #[case] upcoming: bool,
    #[case] expected: Option<chrono::DateTime<chrono::Utc>>,
) {
    let mut repo = MockEvents::new();
    repo.expect_list()
        .withf(move |query| query.upcoming_at == expected && query.limit == 21)
        .return_once(|_| Ok(Vec::new()));

    let page = events(repo)
        .list(upcoming, &PageRequest::default())
        .await
        .expect("listed");
    assert!(page.data.is_empty());
    assert!(page.next_cursor.is_none());
}

#[rstest]
#[tokio::test]
async fn get_missing_record_names_the_kind() {
    let mut repo = MockEvents::new();
    repo.expect_find().return_once(|_| Ok(None));
    let error = events(repo)
        .get(&EventId::random())
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.message(), "event not found");
}

#[rstest]
#[tokio::test]
async fn update_by_stranger_is_forbidden() {
    let mut repo = MockStories::new();
    repo.expect_find()
        .return_once(|_| Ok(Some(story_by(UserId::random()))));
    repo.expect_update().never();

    let error = stories(repo)
        .update(&actor(Role::Moderator), &StoryId::random(), story_draft())
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn author_can_update_own_story() {
    let author = actor(Role::Alumni);
    let author_id = author.id;
    let mut repo = MockStories::new();
    repo.expect_find()
        .return_once(move |_| Ok(Some(story_by(author_id))));
    repo.expect_update()
        .withf(|story| story.title == "Rewritten")
        .return_once(|_| Ok(true));

    let story = stories(repo)
        .update(&author, &StoryId::random(), story_draft())
        .await
        .expect("updated");
    assert_eq!(story.body, "New body");
    assert_eq!(story.author_id, author_id);
}

#[rstest]
#[tokio::test]
async fn admin_can_delete_any_story() {
    let mut repo = MockStories::new();
    repo.expect_find()
        .return_once(|_| Ok(Some(story_by(UserId::random()))));
    repo.expect_delete().times(1).return_once(|_| Ok(true));

    stories(repo)
        .delete(&actor(Role::Admin), &StoryId::random())
        .await
        .expect("deleted");
}

#[rstest]
#[tokio::test]
async fn repository_outage_is_service_unavailable() {
    let mut repo = MockStories::new();
    repo.expect_list()
        .return_once(|_| Err(ContentRepositoryError::connection("pool exhausted")));
    let error = stories(repo)
        .list(false, &PageRequest::default())
        .await
        .expect_err("unavailable");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
fn validation_errors_carry_field_details() {
    let error = map_content_validation(ContentValidationError::Missing { field: "title" });
    let details = error.details().expect("details");
    assert_eq!(details.get("field"), Some(&Value::from("title")));
    assert_eq!(details.get("code"), Some(&Value::from("missing_field")));
}
