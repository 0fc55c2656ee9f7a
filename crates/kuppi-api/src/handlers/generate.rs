//! Question answering and summarization via the generation backend.

use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use kuppi_inference::{answer_prompt, clamp_percentage, summary_prompt, SummaryStyle};

use super::present;
use crate::auth::RequireAuth;
use crate::{ApiError, ApiJson, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub question: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SummaryRequest {
    pub content: Option<String>,
    /// Target length as a percentage of the input (1-100, default 50).
    pub percentage: Option<i64>,
    /// `casual` (default), `formal` or `academic`.
    pub style: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[utoipa::path(post, path = "/generate-answer", tag = "Generation",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Generated answer", body = AnswerResponse),
        (status = 400, description = "Question missing"),
        (status = 500, description = "Generation failed"),
    ))]
pub async fn generate_answer(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let question = present(&req.question)
        .ok_or_else(|| ApiError::BadRequest("Question is required".to_string()))?;

    let start = Instant::now();
    let answer = state.generator.generate(&answer_prompt(question)).await?;
    info!(
        subsystem = "inference",
        component = "generate",
        op = "answer",
        email = %auth.email,
        model = state.generator.model_name(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Answer generated"
    );
    Ok(Json(AnswerResponse { answer }))
}

#[utoipa::path(post, path = "/generate-summary", tag = "Generation",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "Generated summary", body = SummaryResponse),
        (status = 400, description = "Content missing"),
        (status = 500, description = "Generation failed"),
    ))]
pub async fn generate_summary(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<SummaryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    let content = present(&req.content)
        .ok_or_else(|| ApiError::BadRequest("Content is required".to_string()))?;
    let percentage = clamp_percentage(req.percentage);
    let style = SummaryStyle::parse_lenient(req.style.as_deref());

    let start = Instant::now();
    let summary = state
        .generator
        .generate(&summary_prompt(content, percentage, style))
        .await?;
    info!(
        subsystem = "inference",
        component = "generate",
        op = "summary",
        email = %auth.email,
        model = state.generator.model_name(),
        percentage,
        duration_ms = start.elapsed().as_millis() as u64,
        "Summary generated"
    );
    Ok(Json(SummaryResponse { summary }))
}
