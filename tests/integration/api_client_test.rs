use mockito::Matcher;
use serde_json::{json, Value};

use eventdesk::DeskError;

use super::test_harness::{TestEnvironment, UNREACHABLE_ROOT};

#[tokio::test]
async fn test_authorized_get_sends_bearer() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let events = env
        .server
        .mock("GET", "/api/events/")
        .match_header("authorization", "Bearer A")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let value = env.desk.client.get_authorized("events/").await.unwrap();
    assert_eq!(value, json!([]));
    events.assert_async().await;
}

#[tokio::test]
async fn test_empty_store_request_is_sent_and_rejected() {
    let mut env = TestEnvironment::new().await;
    let tasks = env
        .server
        .mock("GET", "/api/tasks/")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"detail": "Authentication credentials were not provided."}).to_string())
        .create_async()
        .await;

    let err = env.desk.client.get_authorized("tasks/").await.unwrap_err();
    tasks.assert_async().await;
    assert!(matches!(err, DeskError::Auth { status: 401, .. }));
}

#[tokio::test]
async fn test_put_and_delete() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let put = env
        .server
        .mock("PUT", "/api/events/5/")
        .match_header("authorization", "Bearer A")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"name": "Renamed"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 5, "name": "Renamed"}).to_string())
        .create_async()
        .await;
    let delete = env
        .server
        .mock("DELETE", "/api/events/5/")
        .with_status(204)
        .create_async()
        .await;

    let updated = env
        .desk
        .client
        .put_authorized("events/5/", &json!({"name": "Renamed"}))
        .await
        .unwrap();
    assert_eq!(updated["name"], "Renamed");

    let deleted = env.desk.client.delete_authorized("events/5/").await.unwrap();
    assert_eq!(deleted, Value::Null);

    put.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_unparseable_error_body_uses_generic_message() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let _events = env
        .server
        .mock("POST", "/api/events/")
        .with_status(500)
        .with_body("<h1>Server Error (500)</h1>")
        .create_async()
        .await;

    let err = env
        .desk
        .client
        .post_authorized("events/", &json!({"name": "Gala"}))
        .await
        .unwrap_err();
    match err {
        DeskError::Api {
            status,
            message,
            payload,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Request failed with status 500");
            assert!(payload.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let env = TestEnvironment::new().await;
    let offline = env.reopen(UNREACHABLE_ROOT).await;

    let err = offline.client.get_authorized("events/").await.unwrap_err();
    assert!(matches!(err, DeskError::Network(_)));
}
