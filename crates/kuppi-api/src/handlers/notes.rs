//! Notes owned by the authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kuppi_core::{Note, NoteSummary};

use super::MessageResponse;
use crate::auth::RequireAuth;
use crate::{ApiJson, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddNoteResponse {
    pub success: bool,
    pub note_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteListResponse {
    pub notes: Vec<NoteSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteResponse {
    pub note: Note,
}

#[utoipa::path(post, path = "/notes", tag = "Notes",
    request_body = AddNoteRequest,
    responses(
        (status = 201, description = "Note created", body = AddNoteResponse),
        (status = 400, description = "Title or content missing"),
        (status = 404, description = "User not found"),
    ))]
pub async fn add_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<AddNoteRequest>,
) -> ApiResult<(StatusCode, Json<AddNoteResponse>)> {
    let note = state
        .notes
        .add(&auth.email, req.title.as_deref(), req.content.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddNoteResponse {
            success: true,
            note_id: note.id,
        }),
    ))
}

/// List notes (id and title) in creation order.
#[utoipa::path(get, path = "/notes", tag = "Notes",
    responses(
        (status = 200, description = "Note titles", body = NoteListResponse),
        (status = 404, description = "User not found"),
    ))]
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> ApiResult<Json<NoteListResponse>> {
    let notes = state.notes.list(&auth.email).await?;
    Ok(Json(NoteListResponse { notes }))
}

#[utoipa::path(get, path = "/notes/{id}", tag = "Notes",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 400, description = "Malformed note id"),
        (status = 404, description = "User or note not found"),
    ))]
pub async fn get_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> ApiResult<Json<NoteResponse>> {
    let note = state.notes.get(&auth.email, &id).await?;
    Ok(Json(NoteResponse { note }))
}

#[utoipa::path(delete, path = "/notes/{id}", tag = "Notes",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 400, description = "Malformed note id"),
        (status = 404, description = "User or note not found"),
    ))]
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.notes.delete(&auth.email, &id).await?;
    Ok(MessageResponse::ok("Note deleted successfully!"))
}

#[utoipa::path(delete, path = "/notes", tag = "Notes",
    responses(
        (status = 200, description = "All notes deleted", body = MessageResponse),
        (status = 404, description = "User not found"),
    ))]
pub async fn delete_all_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> ApiResult<Json<MessageResponse>> {
    state.notes.delete_all(&auth.email).await?;
    Ok(MessageResponse::ok("All notes deleted successfully!"))
}
