//! Tests for the authentication service.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockPasswordHasher, MockUserRepository, MockVerificationNotifier, VerificationNotifierError,
};
use crate::domain::{ErrorCode, PasswordHash};
use crate::test_support::{MutableClock, fixture_now};

struct Doubles {
    users: MockUserRepository,
    hasher: MockPasswordHasher,
    notifier: MockVerificationNotifier,
    settings: AuthSettings,
}

impl Doubles {
    fn new() -> Self {
        Self {
            users: MockUserRepository::new(),
            hasher: MockPasswordHasher::new(),
            notifier: MockVerificationNotifier::new(),
            settings: AuthSettings::default(),
        }
    }

    fn build(self) -> AuthService {
        self.build_with_clock(Arc::new(MutableClock::at_fixture_now()))
    }

    fn build_with_clock(self, clock: Arc<MutableClock>) -> AuthService {
        AuthService::new(
            Arc::new(self.users),
            Arc::new(self.hasher),
            Arc::new(self.notifier),
            clock,
            self.settings,
        )
    }
}

fn registration() -> Registration {
    Registration::try_from_parts("Ada@Example.org", "correct horse").expect("valid registration")
}

fn stored_user(verification: Option<EmailVerification>) -> User {
    User {
        id: UserId::random(),
        email: Email::new("ada@example.org").expect("valid email"),
        password_hash: PasswordHash::new("hashed"),
        role: Role::Alumni,
        verified: verification.is_none(),
        verification,
        created_at: fixture_now(),
    }
}

fn expect_successful_insert(doubles: &mut Doubles) {
    doubles
        .users
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    doubles
        .hasher
        .expect_hash()
        .times(1)
        .return_once(|_| Ok(PasswordHash::new("hashed")));
    doubles.users.expect_insert().times(1).return_once(|_| Ok(()));
}

#[rstest]
#[tokio::test]
async fn register_stores_digest_and_sends_plain_token() {
    let mut doubles = Doubles::new();
    expect_successful_insert(&mut doubles);
    let sent: Arc<Mutex<Option<(String, DateTime<Utc>)>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&sent);
    doubles
        .notifier
        .expect_send_verification()
        .times(1)
        .returning(move |_, token, expires_at| {
            *sink.lock().expect("sink lock") = Some((token.to_owned(), expires_at));
            Ok(())
        });

    let user = doubles.build().register(registration()).await.expect("registered");

    let (token, expires_at) = sent
        .lock()
        .expect("sink lock")
        .clone()
        .expect("token sent");
    assert_eq!(token.len(), VERIFICATION_TOKEN_BYTES * 2);
    assert_eq!(expires_at, fixture_now() + Duration::hours(24));
    let pending = user.verification.expect("pending verification");
    assert_eq!(pending.token, digest_token(&token));
    assert_ne!(pending.token, token);
    assert!(!user.verified);
    assert_eq!(user.role, Role::Alumni);
    assert_eq!(user.email.as_ref(), "ada@example.org");
}

#[rstest]
#[tokio::test]
async fn register_rejects_taken_email() {
    let mut doubles = Doubles::new();
    doubles
        .users
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(Some(stored_user(None))));
    doubles.users.expect_insert().never();

    let error = doubles
        .build()
        .register(registration())
        .await
        .expect_err("duplicate email");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn register_maps_insert_race_to_conflict() {
    let mut doubles = Doubles::new();
    doubles
        .users
        .expect_find_by_email()
        .return_once(|_| Ok(None));
    doubles
        .hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordHash::new("hashed")));
    doubles
        .users
        .expect_insert()
        .return_once(|_| Err(UserPersistenceError::duplicate_email()));

    let error = doubles
        .build()
        .register(registration())
        .await
        .expect_err("duplicate email");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn register_promotes_configured_admins() {
    let mut doubles = Doubles::new();
    expect_successful_insert(&mut doubles);
    doubles
        .notifier
        .expect_send_verification()
        .returning(|_, _, _| Ok(()));
    doubles.settings.admin_emails = vec![Email::new("ada@example.org").expect("valid email")];

    let user = doubles.build().register(registration()).await.expect("registered");
    assert_eq!(user.role, Role::Admin);
}

#[rstest]
#[tokio::test]
async fn register_survives_notifier_failure() {
    let mut doubles = Doubles::new();
    expect_successful_insert(&mut doubles);
    doubles
        .notifier
        .expect_send_verification()
        .returning(|_, _, _| Err(VerificationNotifierError::delivery("smtp down")));

    let user = doubles.build().register(registration()).await;
    assert!(user.is_ok());
}

#[rstest]
#[tokio::test]
async fn verify_email_marks_account_verified() {
    let mut doubles = Doubles::new();
    let user = stored_user(Some(EmailVerification {
        token: digest_token("abc123"),
        expires_at: fixture_now() + Duration::hours(1),
    }));
    doubles
        .users
        .expect_find_by_verification_token()
        .withf(|digest| digest == digest_token("abc123"))
        .return_once(move |_| Ok(Some(user)));
    doubles
        .users
        .expect_update()
        .withf(|user| user.verified && user.verification.is_none())
        .return_once(|_| Ok(true));

    let verified = doubles.build().verify_email(" abc123 ").await.expect("verified");
    assert!(verified.verified);
}

#[rstest]
#[tokio::test]
async fn verify_email_rejects_unknown_token() {
    let mut doubles = Doubles::new();
    doubles
        .users
        .expect_find_by_verification_token()
        .return_once(|_| Ok(None));

    let error = doubles.build().verify_email("nope").await.expect_err("unknown");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn verify_email_rejects_expired_token() {
    let mut doubles = Doubles::new();
    let user = stored_user(Some(EmailVerification {
        token: digest_token("abc123"),
        expires_at: fixture_now() + Duration::hours(24),
    }));
    doubles
        .users
        .expect_find_by_verification_token()
        .return_once(move |_| Ok(Some(user)));
    doubles.users.expect_update().never();
    let clock = Arc::new(MutableClock::at_fixture_now());
    clock.advance_hours(25);

    let error = doubles
        .build_with_clock(clock)
        .verify_email("abc123")
        .await
        .expect_err("expired");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|details| details.get("code")),
        Some(&json!("token_expired"))
    );
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::Unauthorized))]
#[tokio::test]
async fn authenticate_checks_password(
    #[case] password_matches: bool,
    #[case] expected_error: Option<ErrorCode>,
) {
    let mut doubles = Doubles::new();
    let user = stored_user(None);
    let user_id = user.id;
    doubles
        .users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(user)));
    doubles
        .hasher
        .expect_verify()
        .return_once(move |_, _| Ok(password_matches));
    let credentials =
        LoginCredentials::try_from_parts("ada@example.org", "secret").expect("credentials");

    let result = doubles.build().authenticate(&credentials).await;
    match expected_error {
        None => assert_eq!(result.expect("authenticated").id, user_id),
        Some(code) => {
            let error = result.expect_err("rejected");
            assert_eq!(error.code(), code);
            assert_eq!(error.message(), "invalid credentials");
        }
    }
}

#[rstest]
#[tokio::test]
async fn authenticate_hides_unknown_emails() {
    let mut doubles = Doubles::new();
    doubles
        .users
        .expect_find_by_email()
        .times(2)
        .returning(|_| Ok(None));
    doubles
        .hasher
        .expect_hash()
        .times(1)
        .return_once(|_| Ok(PasswordHash::new("placeholder")));
    doubles
        .hasher
        .expect_verify()
        .withf(|password, hash| password == "secret" && hash.as_str() == "placeholder")
        .times(2)
        .returning(|_, _| Ok(true));
    let credentials =
        LoginCredentials::try_from_parts("ghost@example.org", "secret").expect("credentials");
    let service = doubles.build();

    for _ in 0..2 {
        let error = service
            .authenticate(&credentials)
            .await
            .expect_err("unknown email");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), "invalid credentials");
    }
}

#[rstest]
#[tokio::test]
async fn current_user_requires_existing_account() {
    let mut doubles = Doubles::new();
    doubles.users.expect_find_by_id().return_once(|_| Ok(None));

    let error = doubles
        .build()
        .current_user(&UserId::random())
        .await
        .expect_err("missing account");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
