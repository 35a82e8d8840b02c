use mockito::Matcher;
use serde_json::json;

use eventdesk::auth::SessionState;
use eventdesk::{Credentials, DeskError, Registration, TokenPair};

use super::test_harness::TestEnvironment;

#[tokio::test]
async fn test_login_persists_session() {
    let mut env = TestEnvironment::new().await;
    let token = env.mock_token("alice", "s3cret", "A", "R").await;

    env.desk
        .session
        .sign_in(&Credentials::new("alice", "s3cret"))
        .await
        .unwrap();

    token.assert_async().await;
    assert_eq!(
        env.desk.tokens.get().await.unwrap(),
        Some(TokenPair::new("A", "R"))
    );
    assert!(env.desk.session.is_authenticated().await.unwrap());

    // A restart finds the same session on disk
    let url = format!("{}/api/", env.server.url());
    let reopened = env.reopen(&url).await;
    assert_eq!(
        reopened.session.state().await.unwrap(),
        SessionState::Authenticated
    );
}

#[tokio::test]
async fn test_empty_credentials_send_nothing() {
    let mut env = TestEnvironment::new().await;
    let token = env
        .server
        .mock("POST", "/api/token/")
        .expect(0)
        .create_async()
        .await;

    let err = env
        .desk
        .session
        .sign_in(&Credentials::new("", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::Validation(_)));

    token.assert_async().await;
    assert!(!env.desk.session.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_password_mismatch_sends_nothing() {
    let mut env = TestEnvironment::new().await;
    let register = env
        .server
        .mock("POST", "/api/register/")
        .expect(0)
        .create_async()
        .await;

    let err = env
        .desk
        .session
        .register(&Registration::new("bob", "hunter2", "hunter3"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Passwords do not match");

    register.assert_async().await;
}

#[tokio::test]
async fn test_registration_logs_in_with_same_credentials() {
    let mut env = TestEnvironment::new().await;
    let register = env
        .server
        .mock("POST", "/api/register/")
        .match_body(Matcher::Json(json!({"username": "bob", "password": "pw"})))
        .with_status(201)
        .create_async()
        .await;
    let token = env.mock_token("bob", "pw", "A2", "R2").await;

    env.desk
        .session
        .register(&Registration::new("bob", "pw", "pw"))
        .await
        .unwrap();

    register.assert_async().await;
    token.assert_async().await;
    assert_eq!(
        env.desk.tokens.get().await.unwrap(),
        Some(TokenPair::new("A2", "R2"))
    );
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let env = TestEnvironment::new().await.logged_in("A").await;

    env.desk.session.logout().await.unwrap();
    assert_eq!(env.desk.tokens.get().await.unwrap(), None);
    env.desk.session.logout().await.unwrap();
    assert_eq!(env.desk.tokens.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_rejected_login_reports_server_message() {
    let mut env = TestEnvironment::new().await;
    let _token = env.mock_json(
        "POST",
        "token/",
        401,
        &json!({"detail": "No active account found with the given credentials"}),
    )
    .await;

    let err = env
        .desk
        .session
        .sign_in(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
    assert!(err
        .user_message()
        .contains("No active account found with the given credentials"));
}
