//! Notes CRUD over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

async fn add(app: &TestApp, token: &str, title: &str, content: &str) -> String {
    let res = app
        .authed(
            Method::POST,
            "/notes",
            token,
            Some(json!({"title": title, "content": content})),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    assert_eq!(res.body["success"], true);
    res.body["note_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn notes_require_authentication() {
    let app = TestApp::new();
    let res = app
        .send(common::json_request(Method::GET, "/notes", None, None))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_list_get_delete() {
    let app = TestApp::new();
    let token = app.register("a@x.com", "A", "p").await;

    let first = add(&app, &token, "Physics", "F = ma").await;
    let second = add(&app, &token, "Chemistry", "H2O").await;

    let res = app.authed(Method::GET, "/notes", &token, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body["notes"],
        json!([
            {"id": first, "title": "Physics"},
            {"id": second, "title": "Chemistry"},
        ])
    );

    let res = app
        .authed(Method::GET, &format!("/notes/{}", first), &token, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["note"]["content"], "F = ma");

    let res = app
        .authed(Method::DELETE, &format!("/notes/{}", first), &token, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Note deleted successfully!");

    let res = app
        .authed(Method::GET, &format!("/notes/{}", first), &token, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.authed(Method::DELETE, "/notes", &token, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "All notes deleted successfully!");

    let res = app.authed(Method::GET, "/notes", &token, None).await;
    assert_eq!(res.body["notes"], json!([]));
}

#[tokio::test]
async fn malformed_and_unknown_ids() {
    let app = TestApp::new();
    let token = app.register("a@x.com", "A", "p").await;

    let res = app
        .authed(Method::GET, "/notes/not-a-uuid", &token, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .authed(
            Method::DELETE,
            &format!("/notes/{}", Uuid::now_v7()),
            &token,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn title_and_content_are_required() {
    let app = TestApp::new();
    let token = app.register("a@x.com", "A", "p").await;

    let res = app
        .authed(Method::POST, "/notes", &token, Some(json!({"title": "Only"})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notes_are_private_to_their_owner() {
    let app = TestApp::new();
    let alice = app.register("alice@x.com", "Alice", "p").await;
    let bob = app.register("bob@x.com", "Bob", "p").await;

    let id = add(&app, &alice, "Diary", "secret").await;

    let res = app
        .authed(Method::GET, &format!("/notes/{}", id), &bob, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.authed(Method::GET, "/notes", &bob, None).await;
    assert_eq!(res.body["notes"], json!([]));
}
