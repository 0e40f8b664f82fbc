// ============================================================================
// Notes Routes
// ============================================================================
//
// Endpoints:
// - POST   /notes      - Create a note
// - GET    /notes      - List the caller's notes (optional ?folder_id=)
// - GET    /notes/:id  - Fetch one note
// - PUT    /notes/:id  - Partial update
// - DELETE /notes/:id  - Delete
//
// Every operation is scoped to the authenticated owner; another user's
// note ids resolve as not found.
//
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::AppContext;
use crate::db::{self, decode_tags, encode_tags, Note};
use crate::routes::extractors::CurrentUser;
use notehub_error::AppError;
use notehub_metrics::NOTES_CREATED_TOTAL;

/// Request body for POST /notes
#[derive(Debug, Deserialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub folder_id: Option<i64>,
}

/// Request body for PUT /notes/{id}. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub folder_id: Option<i64>,
}

/// Query parameters for GET /notes
#[derive(Debug, Deserialize)]
pub struct NoteListQuery {
    pub folder_id: Option<i64>,
}

/// Public view of a note; stored tags decoded back to a list
#[derive(Debug, Serialize)]
pub struct NoteRead {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub folder_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteRead {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags.as_deref().map(decode_tags).unwrap_or_default(),
            color: note.color,
            folder_id: note.folder_id,
            user_id: note.user_id,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Title must not be empty"));
    }
    if title.len() > 100 {
        return Err(AppError::validation("Title must not exceed 100 characters"));
    }
    Ok(())
}

/// A folder reference must point at a folder the caller owns
async fn ensure_folder_exists(
    context: &AppContext,
    user_id: i64,
    folder_id: i64,
) -> Result<(), AppError> {
    match db::get_folder(&context.db_pool, user_id, folder_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(AppError::validation("Folder not found")),
        Err(e) => {
            tracing::error!(error = %e, folder_id = folder_id, "Failed to check folder");
            Err(AppError::Unknown(e))
        }
    }
}

/// Encode tags for storage, bounded by the column width
fn tags_for_storage(tags: &[String]) -> Result<String, AppError> {
    let encoded = encode_tags(tags)?;
    if encoded.len() > 250 {
        return Err(AppError::validation("Tags must not exceed 250 characters"));
    }
    Ok(encoded)
}

/// POST /notes
pub async fn create_note(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<NoteCreate>,
) -> Result<impl IntoResponse, AppError> {
    validate_title(&request.title)?;

    if let Some(folder_id) = request.folder_id {
        ensure_folder_exists(&context, user.id, folder_id).await?;
    }

    let tags = tags_for_storage(&request.tags)?;

    let note = db::create_note(
        &context.db_pool,
        user.id,
        &request.title,
        request.content.as_deref(),
        Some(&tags),
        request.color.as_deref(),
        request.folder_id,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to create note");
        AppError::Unknown(e)
    })?;

    NOTES_CREATED_TOTAL.inc();
    tracing::debug!(note_id = note.id, "Note created");

    Ok((StatusCode::CREATED, Json(NoteRead::from(note))))
}

/// GET /notes
///
/// Newest-updated first; `?folder_id=` restricts to one folder.
pub async fn list_notes(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NoteListQuery>,
) -> Result<Json<Vec<NoteRead>>, AppError> {
    let notes = db::list_notes(&context.db_pool, user.id, query.folder_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list notes");
            AppError::Unknown(e)
        })?;

    Ok(Json(notes.into_iter().map(NoteRead::from).collect()))
}

/// GET /notes/{id}
pub async fn get_note(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(note_id): Path<i64>,
) -> Result<Json<NoteRead>, AppError> {
    let note = db::get_note(&context.db_pool, user.id, note_id)
        .await?
        .ok_or_else(|| AppError::not_found("Note not found"))?;

    Ok(Json(NoteRead::from(note)))
}

/// PUT /notes/{id}
pub async fn update_note(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(note_id): Path<i64>,
    Json(request): Json<NoteUpdate>,
) -> Result<Json<NoteRead>, AppError> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }

    if let Some(folder_id) = request.folder_id {
        ensure_folder_exists(&context, user.id, folder_id).await?;
    }

    let tags = match &request.tags {
        Some(tags) => Some(tags_for_storage(tags)?),
        None => None,
    };

    let note = db::update_note(
        &context.db_pool,
        user.id,
        note_id,
        request.title.as_deref(),
        request.content.as_deref(),
        tags.as_deref(),
        request.color.as_deref(),
        request.folder_id,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Note not found"))?;

    Ok(Json(NoteRead::from(note)))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(note_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_note(&context.db_pool, user.id, note_id).await?;

    if !deleted {
        return Err(AppError::not_found("Note not found"));
    }

    tracing::debug!(note_id = note_id, "Note deleted");
    Ok(StatusCode::NO_CONTENT)
}
