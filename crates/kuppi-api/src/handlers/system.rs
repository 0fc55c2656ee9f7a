//! Health and API description endpoints.

use axum::{http::header, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::{ApiError, ApiResult};

#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Server is up")))]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The OpenAPI document rendered as YAML.
pub async fn openapi_yaml() -> ApiResult<impl IntoResponse> {
    let spec = crate::ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| ApiError::Internal(format!("Failed to render OpenAPI document: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "application/yaml")], spec))
}
