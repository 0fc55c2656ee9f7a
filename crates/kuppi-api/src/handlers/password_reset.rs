//! Password reset endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{present, MessageResponse};
use crate::{ApiError, ApiJson, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyResetOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[utoipa::path(post, path = "/request-pass-reset", tag = "Password Reset",
    request_body = RequestResetRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 404, description = "User not found"),
        (status = 429, description = "OTP requested inside the cooldown"),
        (status = 500, description = "OTP could not be sent"),
    ))]
pub async fn request_pass_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RequestResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = present(&req.email)
        .ok_or_else(|| ApiError::BadRequest("Email is required!".to_string()))?;

    state.password_reset.request_reset(email).await?;
    Ok(MessageResponse::ok("OTP sent to your email."))
}

#[utoipa::path(post, path = "/verify-pass-reset-otp", tag = "Password Reset",
    request_body = VerifyResetOtpRequest,
    responses(
        (status = 200, description = "OTP verified", body = MessageResponse),
        (status = 400, description = "Missing, expired or wrong OTP"),
        (status = 403, description = "Too many incorrect attempts"),
    ))]
pub async fn verify_pass_reset_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyResetOtpRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (Some(email), Some(otp)) = (present(&req.email), present(&req.otp)) else {
        return Err(ApiError::BadRequest("Email and OTP are required!".to_string()));
    };

    state.password_reset.verify_otp(email, otp).await?;
    Ok(MessageResponse::ok(
        "OTP verified. You can now reset your password.",
    ))
}

#[utoipa::path(post, path = "/reset-password", tag = "Password Reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "Reset OTP not verified or authorization expired"),
        (status = 404, description = "User not found"),
    ))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (Some(email), Some(new_password)) = (present(&req.email), present(&req.new_password))
    else {
        return Err(ApiError::BadRequest(
            "Email and new password are required!".to_string(),
        ));
    };

    state
        .password_reset
        .reset_password(email, new_password)
        .await?;
    Ok(MessageResponse::ok("Password reset successful."))
}
