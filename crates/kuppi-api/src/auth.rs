//! Bearer-token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{ApiError, AppState};

/// The authenticated account, resolved from `Authorization: Bearer <token>`.
///
/// ```ignore
/// async fn my_handler(auth: RequireAuth) -> ApiResult<Json<Value>> {
///     let notes = state.notes.list(&auth.email).await?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.trim_start_matches("Bearer ").trim()
            }
            _ => {
                return Err(ApiError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            }
        };
        if token.is_empty() {
            return Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            ));
        }

        let email = state.sessions.authenticate(token)?;
        Ok(RequireAuth { email })
    }
}
