//! OCR uploads and generation endpoints.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{multipart_body, multipart_request, png_bytes, TestApp, TestOptions};
use kuppi_inference::mock::{MockGenerationBackend, MockOcrEngine};

#[tokio::test]
async fn ocr_extracts_text_with_default_language() {
    let app = TestApp::new();
    let png = png_bytes();
    let body = multipart_body(&[("image", Some("page.png"), png.as_slice())]);

    let res = app.send(multipart_request("/ocr", body)).await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["text"], "ශ්‍රී ලංකාව");
    assert_eq!(app.ocr.languages(), vec!["sin".to_string()]);
}

#[tokio::test]
async fn ocr_honours_lang_field() {
    let app = TestApp::new();
    let png = png_bytes();
    let body = multipart_body(&[
        ("image", Some("page.png"), png.as_slice()),
        ("lang", None, &b"sin+eng"[..]),
    ]);

    let res = app.send(multipart_request("/ocr", body)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.ocr.languages(), vec!["sin+eng".to_string()]);
}

#[tokio::test]
async fn ocr_rejects_missing_or_non_image_upload() {
    let app = TestApp::new();

    let res = app
        .send(multipart_request("/ocr", multipart_body(&[("lang", None, &b"eng"[..])])))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "No image uploaded");

    let body = multipart_body(&[("image", Some("notes.txt"), &b"plain text, not pixels"[..])]);
    let res = app.send(multipart_request("/ocr", body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.ocr.languages().is_empty());
}

#[tokio::test]
async fn ocr_engine_failure_is_server_error() {
    let app = TestApp::with(TestOptions {
        ocr: Some(MockOcrEngine::failing()),
        ..TestOptions::default()
    });
    let png = png_bytes();
    let res = app
        .send(multipart_request(
            "/ocr",
            multipart_body(&[("image", Some("page.png"), png.as_slice())]),
        ))
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn generation_requires_authentication() {
    let app = TestApp::new();
    let res = app
        .post("/generate-answer", json!({"question": "What is 2 + 2?"}))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.generator.call_count(), 0);
}

#[tokio::test]
async fn generate_answer_passes_question_through() {
    let app = TestApp::new();
    let token = app.register("a@x.com", "A", "p").await;

    let res = app
        .authed(
            Method::POST,
            "/generate-answer",
            &token,
            Some(json!({"question": "  What is photosynthesis?  "})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["answer"], "mock output");
    assert_eq!(app.generator.prompts(), vec!["What is photosynthesis?"]);

    let res = app
        .authed(Method::POST, "/generate-answer", &token, Some(json!({})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_summary_clamps_and_styles_prompt() {
    let app = TestApp::new();
    let token = app.register("a@x.com", "A", "p").await;

    let res = app
        .authed(
            Method::POST,
            "/generate-summary",
            &token,
            Some(json!({"content": "Long text", "percentage": 250, "style": "formal"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["summary"], "mock output");

    let prompt = app.generator.prompts().pop().unwrap();
    assert!(prompt.contains("approximately 100%"));
    assert!(prompt.contains("professional and straightforward"));
    assert!(prompt.ends_with("Long text"));

    app.authed(
        Method::POST,
        "/generate-summary",
        &token,
        Some(json!({"content": "Other text", "style": "pirate"})),
    )
    .await;
    let prompt = app.generator.prompts().pop().unwrap();
    assert!(prompt.contains("approximately 50%"));
    assert!(prompt.contains("conversational and easy to understand"));
}

#[tokio::test]
async fn generation_failure_is_server_error() {
    let app = TestApp::with(TestOptions {
        generator: Some(MockGenerationBackend::new().failing("quota exhausted")),
        ..TestOptions::default()
    });
    let token = app.register("a@x.com", "A", "p").await;

    let res = app
        .authed(
            Method::POST,
            "/generate-summary",
            &token,
            Some(json!({"content": "Long text"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = res.body["error"].as_str().unwrap();
    assert_eq!(message, "Failed to generate a response");
    assert!(!message.contains("quota exhausted"));
}
