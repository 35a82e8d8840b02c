use mockito::Matcher;
use serde_json::json;

use eventdesk::models::{EventDraft, RecordId, TaskStatus};
use eventdesk::resources::ListSource;
use eventdesk::ViewOutcome;

use super::test_harness::{TestEnvironment, UNREACHABLE_ROOT};

#[tokio::test]
async fn test_created_event_is_listed() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let create = env
        .server
        .mock("POST", "/api/events/")
        .match_body(Matcher::Json(json!({
            "name": "Summer Gala",
            "description": "Fundraiser",
            "date": "2025-07-01",
            "location": "Main Hall"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": 1,
                "name": "Summer Gala",
                "description": "Fundraiser",
                "date": "2025-07-01",
                "location": "Main Hall",
                "tasks": [],
                "attendees_count": 0
            })
            .to_string(),
        )
        .create_async()
        .await;
    let list = env.mock_json(
        "GET",
        "events/",
        200,
        &json!([{
            "id": 1,
            "name": "Summer Gala",
            "description": "Fundraiser",
            "date": "2025-07-01",
            "location": "Main Hall",
            "tasks": [],
            "attendees_count": 0
        }]),
    )
    .await;

    let draft = EventDraft {
        name: "Summer Gala".into(),
        description: "Fundraiser".into(),
        date: "2025-07-01".into(),
        location: "Main Hall".into(),
    };
    let events = env.desk.resource::<eventdesk::models::Event>();
    events.create(&draft).await.unwrap();
    create.assert_async().await;

    let listing = events.list().await.unwrap();
    let found = listing
        .items
        .iter()
        .find(|e| e.name == draft.name)
        .expect("created event is listed");
    assert_eq!(found.description, draft.description);
    assert_eq!(found.date, draft.date);
    assert_eq!(found.location, draft.location);
    list.assert_async().await;
}

#[tokio::test]
async fn test_search_filters_event_view() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let _events = env.mock_json(
        "GET",
        "events/",
        200,
        &json!([
            {"id": 1, "name": "Summer Gala"},
            {"id": 2, "name": "Winter Ball"}
        ]),
    )
    .await;

    let mut view = env.desk.events_view();
    assert_eq!(view.refresh().await, ViewOutcome::Done);

    env.desk.search.set_term("gala");
    let names: Vec<_> = view.visible().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Summer Gala"]);

    env.desk.search.set_term("");
    assert_eq!(view.visible().len(), 2);
}

#[tokio::test]
async fn test_cached_tasks_survive_outage_and_restart() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let _tasks = env
        .mock_json("GET", "tasks/", 200, &json!([{"id": "1", "name": "Setup"}]))
        .await;

    let mut view = env.desk.tasks_view();
    assert!(view.refresh().await.is_done());
    assert_eq!(view.source(), Some(ListSource::Live));

    let offline = env.reopen(UNREACHABLE_ROOT).await;
    let mut offline_view = offline.tasks_view();
    assert_eq!(offline_view.refresh().await, ViewOutcome::Done);
    assert_eq!(offline_view.source(), Some(ListSource::Cache));

    let tasks = offline_view.items();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, RecordId::Text("1".into()));
    assert_eq!(tasks[0].name, "Setup");
    assert_eq!(offline_view.error(), None);
}

#[tokio::test]
async fn test_expired_token_forces_login() {
    let mut env = TestEnvironment::new().await.logged_in("stale").await;
    let _attendees = env.mock_json(
        "GET",
        "attendees/",
        401,
        &json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
    )
    .await;
    let mut events = env.desk.session.subscribe();

    let mut view = env.desk.attendees_view();
    assert_eq!(view.refresh().await, ViewOutcome::LoginRequired);
    assert!(!env.desk.session.is_authenticated().await.unwrap());
    assert!(events.try_recv().is_ok());
}

#[tokio::test]
async fn test_toggle_task_round_trip() {
    let mut env = TestEnvironment::new().await.logged_in("A").await;
    let _tasks = env.mock_json(
        "GET",
        "tasks/",
        200,
        &json!([{"id": 3, "name": "Print badges", "event": 1, "status": "Completed"}]),
    )
    .await;
    let put = env
        .server
        .mock("PUT", "/api/tasks/3/")
        .match_body(Matcher::PartialJson(json!({
            "id": 3,
            "name": "Print badges",
            "event": 1,
            "status": "Pending"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 3, "name": "Print badges", "event": 1, "status": "Pending"}).to_string())
        .create_async()
        .await;

    let mut view = env.desk.tasks_view();
    view.refresh().await;
    assert!(view.toggle_status(&RecordId::Number(3)).await.is_done());
    assert_eq!(view.items()[0].status, TaskStatus::Pending);
    put.assert_async().await;
}
