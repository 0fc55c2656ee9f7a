//! HTTP handlers, one module per route group.

pub mod auth;
pub mod generate;
pub mod notes;
pub mod ocr;
pub mod password_reset;
pub mod system;

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Generic `{success, message}` acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// A request field that is present and not blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
