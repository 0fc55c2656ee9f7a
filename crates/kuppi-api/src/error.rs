//! HTTP error mapping.
//!
//! Every failure reaches the client as `{"error": "<message>"}`.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use kuppi_core::Error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests { message: String, retry_after_secs: u64 },
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::TooManyRequests { message, .. } => message,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        // Client mistakes, not server faults.
        if err.is_otp_rejection() {
            debug!(subsystem = "auth", error = %err, "OTP verification rejected");
            let message = err.to_string();
            return if matches!(err, Error::TooManyAttempts) {
                ApiError::Forbidden(message)
            } else {
                ApiError::BadRequest(message)
            };
        }

        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::UserNotFound(_) => ApiError::NotFound("User not found.".to_string()),
            Error::NoteNotFound(_) => ApiError::NotFound("Note not found".to_string()),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            e @ Error::RateLimited { retry_after_secs } => ApiError::TooManyRequests {
                message: e.to_string(),
                retry_after_secs,
            },
            Error::NotificationFailed(detail) => {
                error!(subsystem = "api", error = %detail, "Notification failed");
                ApiError::Internal("Failed to send OTP email".to_string())
            }
            Error::Database(e) => {
                error!(subsystem = "database", error = %e, "Database operation failed");
                ApiError::Internal("Internal server error".to_string())
            }
            Error::Inference(detail) => {
                error!(subsystem = "inference", error = %detail, "Generation failed");
                ApiError::Internal("Failed to generate a response".to_string())
            }
            Error::Ocr(detail) => {
                error!(subsystem = "inference", component = "ocr", error = %detail, "OCR failed");
                ApiError::Internal("Failed to extract text from image".to_string())
            }
            other => {
                error!(subsystem = "api", error = %other, "Request failed");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(
            subsystem = "api",
            status = rejection.status().as_u16(),
            error = %rejection.body_text(),
            "Rejected request body"
        );
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON body with Content-Type: application/json".to_string()
            }
            other => other.body_text(),
        };
        ApiError::BadRequest(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            ApiError::TooManyRequests {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let body = Json(serde_json::json!({
            "error": self.message(),
        }));
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
