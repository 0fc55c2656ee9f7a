//! Router assembly and cross-cutting middleware.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::handlers::{self, auth, generate, notes, ocr, password_reset, system};
use crate::services::AuthSession;
use crate::AppState;

/// Generates UUIDv7 request ids for `x-request-id`.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kuppi API",
        description = "Notes, OCR and study assistance with email OTP account flows"
    ),
    paths(
        auth::signup,
        auth::verify_signup_otp,
        auth::login,
        auth::validate_token,
        password_reset::request_pass_reset,
        password_reset::verify_pass_reset_otp,
        password_reset::reset_password,
        notes::add_note,
        notes::list_notes,
        notes::get_note,
        notes::delete_note,
        notes::delete_all_notes,
        ocr::ocr,
        generate::generate_answer,
        generate::generate_summary,
        system::health_check,
    ),
    components(schemas(
        handlers::MessageResponse,
        auth::SignupRequest,
        auth::VerifyOtpRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        auth::ValidateTokenResponse,
        password_reset::RequestResetRequest,
        password_reset::VerifyResetOtpRequest,
        password_reset::ResetPasswordRequest,
        notes::AddNoteRequest,
        notes::AddNoteResponse,
        notes::NoteListResponse,
        notes::NoteResponse,
        ocr::OcrUpload,
        ocr::OcrResponse,
        generate::AnswerRequest,
        generate::AnswerResponse,
        generate::SummaryRequest,
        generate::SummaryResponse,
        kuppi_core::PublicProfile,
        kuppi_core::Note,
        kuppi_core::NoteSummary,
        AuthSession,
    )),
    tags(
        (name = "Auth", description = "Signup with email OTP, login and token validation"),
        (name = "Password Reset", description = "Email OTP password reset"),
        (name = "Notes", description = "Per-user notes"),
        (name = "OCR", description = "Text extraction from images"),
        (name = "Generation", description = "Answers and summaries"),
        (name = "System", description = "Health checks"),
    )
)]
pub struct ApiDoc;

/// Parse the configured CORS whitelist, skipping unparseable entries.
fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Auth
        .route("/signup", post(auth::signup))
        .route("/verify-signup-otp", post(auth::verify_signup_otp))
        .route("/login", post(auth::login))
        .route("/validate-token", post(auth::validate_token))
        // Password reset
        .route("/request-pass-reset", post(password_reset::request_pass_reset))
        .route(
            "/verify-pass-reset-otp",
            post(password_reset::verify_pass_reset_otp),
        )
        .route("/reset-password", post(password_reset::reset_password))
        // Notes
        .route(
            "/notes",
            post(notes::add_note)
                .get(notes::list_notes)
                .delete(notes::delete_all_notes),
        )
        .route(
            "/notes/:id",
            get(notes::get_note).delete(notes::delete_note),
        )
        // OCR and generation
        .route("/ocr", post(ocr::ocr))
        .route("/generate-answer", post(generate::generate_answer))
        .route("/generate-summary", post(generate::generate_summary))
        // System
        .route("/health", get(system::health_check))
        .route("/openapi.yaml", get(system::openapi_yaml))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(
                    &config.allowed_origins,
                )))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
