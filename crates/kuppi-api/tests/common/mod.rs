#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use kuppi_api::config::AppConfig;
use kuppi_api::services::RecordingNotifier;
use kuppi_api::{build_router, AppState, Collaborators};
use kuppi_core::{ManualClock, OtpLedger, OtpPurpose};
use kuppi_crypto::{KdfParams, PasswordHashing, TokenSigner};
use kuppi_db::{MemoryStore, Stores};
use kuppi_inference::mock::{MockGenerationBackend, MockOcrEngine};

pub const SECRET: &str = "integration-test-secret-0123456789";

#[derive(Default)]
pub struct TestOptions {
    pub env: Vec<(&'static str, &'static str)>,
    pub generator: Option<MockGenerationBackend>,
    pub ocr: Option<MockOcrEngine>,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub generator: Arc<MockGenerationBackend>,
    pub ocr: Arc<MockOcrEngine>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(TestOptions::default())
    }

    pub fn with(options: TestOptions) -> Self {
        let mut env: HashMap<String, String> = [
            ("JWT_SECRET_KEY", SECRET),
            ("STORE_BACKEND", "memory"),
            ("RATE_LIMIT_ENABLED", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in options.env {
            env.insert(k.to_string(), v.to_string());
        }
        let config = AppConfig::from_map(&env).unwrap();

        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::default());
        let generator = Arc::new(
            options
                .generator
                .unwrap_or_else(|| MockGenerationBackend::new().with_fixed_response("mock output")),
        );
        let ocr = Arc::new(options.ocr.unwrap_or_else(|| MockOcrEngine::new("ශ්‍රී ලංකාව")));

        let state = AppState::build(
            &config,
            Stores::in_memory(store.clone()),
            Collaborators {
                notifier: notifier.clone(),
                generator: generator.clone(),
                ocr: ocr.clone(),
                clock: clock.clone(),
            },
            PasswordHashing::new(&KdfParams::insecure_fast()).unwrap(),
            Arc::new(TokenSigner::new(SECRET.as_bytes()).unwrap()),
        );

        Self {
            router: build_router(state, &config),
            store,
            notifier,
            clock,
            generator,
            ocr,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.send(json_request(Method::POST, uri, Some(body), None))
            .await
    }

    pub async fn authed(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> Response {
        self.send(json_request(method, uri, body, Some(token))).await
    }

    /// The live code in `purpose`'s ledger, read straight from the store.
    pub async fn live_code(&self, purpose: OtpPurpose, email: &str) -> Option<String> {
        OtpLedger::get(self.store.as_ref(), purpose, email)
            .await
            .unwrap()
            .map(|e| e.code)
    }

    /// Sign up and confirm an account, returning its token.
    pub async fn register(&self, email: &str, name: &str, password: &str) -> String {
        let res = self
            .post(
                "/signup",
                serde_json::json!({"email": email, "name": name, "password": password}),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);

        let code = self.live_code(OtpPurpose::Signup, email).await.unwrap();
        let res = self
            .post(
                "/verify-signup-otp",
                serde_json::json!({"email": email, "otp": code}),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["token"].as_str().unwrap().to_string()
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Smallest byte sequence `infer` recognises as a PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes.extend_from_slice(&[0; 17]);
    bytes
}

pub const BOUNDARY: &str = "kuppi-test-boundary";

/// Build a `multipart/form-data` body from `(name, filename, bytes)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
