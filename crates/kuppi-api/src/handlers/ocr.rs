//! Image text extraction.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::{ApiError, ApiResult, AppState};

/// Multipart form accepted by `/ocr`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct OcrUpload {
    /// The image file.
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// Tesseract language code, e.g. `sin`, `eng` or `sin+eng`.
    lang: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OcrResponse {
    pub text: String,
}

/// Extract text from an uploaded image.
///
/// The `image` field is required and must sniff as an image; `lang`
/// falls back to the configured default language.
#[utoipa::path(post, path = "/ocr", tag = "OCR",
    request_body(content = OcrUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted text", body = OcrResponse),
        (status = 400, description = "No image uploaded or not an image"),
        (status = 500, description = "OCR engine failed"),
    ))]
pub async fn ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<OcrResponse>> {
    let mut image: Option<Vec<u8>> = None;
    let mut lang: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;
                image = Some(bytes.to_vec());
            }
            Some("lang") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read lang: {}", e)))?;
                let value = value.trim();
                if !value.is_empty() {
                    lang = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image uploaded".to_string()))?;
    if !infer::is_image(&image) {
        return Err(ApiError::BadRequest(
            "Uploaded file is not a supported image".to_string(),
        ));
    }

    let lang = lang.unwrap_or_else(|| state.ocr_default_lang.clone());
    debug!(
        subsystem = "api",
        component = "ocr",
        lang = %lang,
        bytes = image.len(),
        "Running OCR"
    );
    let text = state.ocr.extract(&image, &lang).await?;
    Ok(Json(OcrResponse { text }))
}
