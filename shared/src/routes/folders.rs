// ============================================================================
// Folders Routes
// ============================================================================
//
// Endpoints:
// - POST   /folders               - Create a folder
// - GET    /folders               - List the caller's folders (optional ?parent_id=)
// - GET    /folders/:id           - Fetch one folder
// - GET    /folders/:id/children  - List direct subfolders
// - PUT    /folders/:id           - Partial update
// - DELETE /folders/:id           - Delete; contents are reparented to root
//
// Folder trees are per user; parent references outside the caller's own
// tree are rejected as validation errors.
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
use crate::db::{self, Folder};
use crate::routes::extractors::CurrentUser;
use notehub_error::AppError;
use notehub_metrics::FOLDERS_CREATED_TOTAL;

fn default_color() -> String {
    "#6366f1".to_string()
}

fn default_icon() -> String {
    "📁".to_string()
}

/// Request body for POST /folders
#[derive(Debug, Deserialize)]
pub struct FolderCreate {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub parent_id: Option<i64>,
}

/// Request body for PUT /folders/{id}. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
}

/// Query parameters for GET /folders
#[derive(Debug, Deserialize)]
pub struct FolderListQuery {
    pub parent_id: Option<i64>,
}

/// Public view of a folder
#[derive(Debug, Serialize)]
pub struct FolderRead {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Folder> for FolderRead {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            color: folder.color,
            icon: folder.icon,
            parent_id: folder.parent_id,
            user_id: folder.user_id,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
        }
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if name.len() > 100 {
        return Err(AppError::validation("Name must not exceed 100 characters"));
    }
    Ok(())
}

/// A parent reference must point at a folder the caller owns
async fn ensure_parent_exists(
    context: &AppContext,
    user_id: i64,
    parent_id: i64,
) -> Result<(), AppError> {
    match db::get_folder(&context.db_pool, user_id, parent_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(AppError::validation("Parent folder not found")),
        Err(e) => {
            tracing::error!(error = %e, parent_id = parent_id, "Failed to check parent folder");
            Err(AppError::Unknown(e))
        }
    }
}

/// POST /folders
pub async fn create_folder(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<FolderCreate>,
) -> Result<impl IntoResponse, AppError> {
    validate_name(&request.name)?;

    if let Some(parent_id) = request.parent_id {
        ensure_parent_exists(&context, user.id, parent_id).await?;
    }

    let folder = db::create_folder(
        &context.db_pool,
        user.id,
        &request.name,
        Some(&request.color),
        Some(&request.icon),
        request.parent_id,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to create folder");
        AppError::Unknown(e)
    })?;

    FOLDERS_CREATED_TOTAL.inc();
    tracing::debug!(folder_id = folder.id, "Folder created");

    Ok((StatusCode::CREATED, Json(FolderRead::from(folder))))
}

/// GET /folders
///
/// Sorted by name; `?parent_id=` restricts to one subtree level.
pub async fn list_folders(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FolderListQuery>,
) -> Result<Json<Vec<FolderRead>>, AppError> {
    let folders = db::list_folders(&context.db_pool, user.id, query.parent_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list folders");
            AppError::Unknown(e)
        })?;

    Ok(Json(folders.into_iter().map(FolderRead::from).collect()))
}

/// GET /folders/{id}
pub async fn get_folder(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
) -> Result<Json<FolderRead>, AppError> {
    let folder = db::get_folder(&context.db_pool, user.id, folder_id)
        .await?
        .ok_or_else(|| AppError::not_found("Folder not found"))?;

    Ok(Json(FolderRead::from(folder)))
}

/// GET /folders/{id}/children
pub async fn folder_children(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
) -> Result<Json<Vec<FolderRead>>, AppError> {
    // The parent itself must exist before its children are listed
    db::get_folder(&context.db_pool, user.id, folder_id)
        .await?
        .ok_or_else(|| AppError::not_found("Folder not found"))?;

    let children = db::folder_children(&context.db_pool, user.id, folder_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list folder children");
            AppError::Unknown(e)
        })?;

    Ok(Json(children.into_iter().map(FolderRead::from).collect()))
}

/// PUT /folders/{id}
pub async fn update_folder(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
    Json(request): Json<FolderUpdate>,
) -> Result<Json<FolderRead>, AppError> {
    if let Some(name) = &request.name {
        validate_name(name)?;
    }

    if let Some(parent_id) = request.parent_id {
        if parent_id == folder_id {
            return Err(AppError::validation("A folder cannot be its own parent"));
        }
        ensure_parent_exists(&context, user.id, parent_id).await?;
    }

    let folder = db::update_folder(
        &context.db_pool,
        user.id,
        folder_id,
        request.name.as_deref(),
        request.color.as_deref(),
        request.icon.as_deref(),
        request.parent_id,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Folder not found"))?;

    Ok(Json(FolderRead::from(folder)))
}

/// DELETE /folders/{id}
///
/// Notes inside the folder move to the root and child folders become
/// top-level before the folder row is removed.
pub async fn delete_folder(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_folder_reparent(&context.db_pool, user.id, folder_id).await?;

    if !deleted {
        return Err(AppError::not_found("Folder not found"));
    }

    tracing::debug!(folder_id = folder_id, "Folder deleted, contents reparented to root");
    Ok(StatusCode::NO_CONTENT)
}
