//! Signup, signup confirmation, login and token validation.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use kuppi_core::{Error, PublicProfile};

use super::{present, MessageResponse};
use crate::auth::RequireAuth;
use crate::services::AuthSession;
use crate::{ApiError, ApiJson, ApiResult, AppState};

const MISSING_CREDENTIALS: &str = "Email and password are required!";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus public profile, returned by login and signup confirmation.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicProfile,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            success: true,
            token: session.token,
            user: session.user,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub user: PublicProfile,
}

/// Stage a signup and email a verification code.
#[utoipa::path(post, path = "/signup", tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "User already exists"),
        (status = 429, description = "OTP requested inside the cooldown"),
        (status = 500, description = "OTP could not be sent"),
    ))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (Some(email), Some(password)) = (present(&req.email), present(&req.password)) else {
        return Err(ApiError::BadRequest(MISSING_CREDENTIALS.to_string()));
    };

    state
        .registration
        .signup(email, req.name.as_deref(), password)
        .await?;
    Ok(MessageResponse::ok(
        "OTP sent to your email. Please verify to complete registration.",
    ))
}

/// Confirm a signup with the emailed code and create the account.
#[utoipa::path(post, path = "/verify-signup-otp", tag = "Auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing, expired or wrong OTP"),
        (status = 403, description = "Too many incorrect attempts"),
    ))]
pub async fn verify_signup_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(email), Some(otp)) = (present(&req.email), present(&req.otp)) else {
        return Err(ApiError::BadRequest("Email and OTP are required!".to_string()));
    };

    let session = state.registration.confirm(email, otp).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[utoipa::path(post, path = "/login", tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
    ))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (present(&req.email), present(&req.password)) else {
        return Err(ApiError::BadRequest(MISSING_CREDENTIALS.to_string()));
    };

    let session = state.sessions.login(email, password).await?;
    Ok(Json(session.into()))
}

/// Return the profile behind the bearer token.
#[utoipa::path(post, path = "/validate-token", tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = ValidateTokenResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "Account no longer exists"),
    ))]
pub async fn validate_token(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> ApiResult<Json<ValidateTokenResponse>> {
    let user = state
        .sessions
        .profile(&auth.email)
        .await
        .map_err(|e| match e {
            Error::UserNotFound(_) => {
                ApiError::NotFound("Invalid token or user not found".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(ValidateTokenResponse { user }))
}
