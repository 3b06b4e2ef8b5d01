// src/handlers/folders.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::Exam,
        folder::{ExamFolder, FolderRequest},
    },
    store::pg::EXAM_COLUMNS,
    utils::html::clean_html,
};

/// Lists folders, newest first.
/// Teacher only.
pub async fn list_folders(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let folders = sqlx::query_as::<_, ExamFolder>(
        "SELECT id, name, description, created_at FROM exam_folders ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list folders: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(folders))
}

/// Teacher only.
pub async fn create_folder(
    State(pool): State<PgPool>,
    Json(payload): Json<FolderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO exam_folders (name, description) VALUES ($1, $2) RETURNING id",
    )
    .bind(clean_html(&payload.name))
    .bind(clean_html(payload.description.as_deref().unwrap_or_default()))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create folder: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Teacher only.
pub async fn update_folder(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<FolderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE exam_folders SET name = $1, description = $2 WHERE id = $3")
        .bind(clean_html(&payload.name))
        .bind(clean_html(payload.description.as_deref().unwrap_or_default()))
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Folder not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a folder. Its exams survive without a folder.
/// Teacher only.
pub async fn delete_folder(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_folders WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete folder: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Folder not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the exams filed in a folder, newest first.
/// Teacher only.
pub async fn list_folder_exams(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams WHERE folder_id = $1 ORDER BY created_at DESC",
        EXAM_COLUMNS
    ))
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch folder exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}
