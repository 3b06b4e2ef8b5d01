// src/handlers/students.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        result::StudentResultEntry,
        student::{Student, StudentRequest},
    },
    utils::jwt::Claims,
};

const STUDENT_COLUMNS: &str = "id, student_code, name, class, created_at";

/// Lists all students ordered by class and name.
/// Teacher only.
pub async fn list_students(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, Student>(&format!(
        "SELECT {} FROM students ORDER BY class, name",
        STUDENT_COLUMNS
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list students: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(students))
}

/// Teacher only.
pub async fn get_student(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = sqlx::query_as::<_, Student>(&format!(
        "SELECT {} FROM students WHERE id = $1",
        STUDENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

/// Creates a student.
/// Teacher only. Student codes are unique.
pub async fn create_student(
    State(pool): State<PgPool>,
    Json(payload): Json<StudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student = sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (student_code, name, class) VALUES ($1, $2, $3) RETURNING {}",
        STUDENT_COLUMNS
    ))
    .bind(&payload.student_code)
    .bind(&payload.name)
    .bind(&payload.class)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "Student code '{}' already exists",
                payload.student_code
            ))
        } else {
            tracing::error!("Failed to create student: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// Replaces a student's code, name and class.
/// Teacher only.
pub async fn update_student(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<StudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result =
        sqlx::query("UPDATE students SET student_code = $1, name = $2, class = $3 WHERE id = $4")
            .bind(&payload.student_code)
            .bind(&payload.name)
            .bind(&payload.class)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!(
                        "Student code '{}' already exists",
                        payload.student_code
                    ))
                } else {
                    tracing::error!("Failed to update student: {:?}", e);
                    AppError::InternalServerError(e.to_string())
                }
            })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a student and, through the foreign key, their results.
/// Teacher only.
pub async fn delete_student(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete student: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a student's results, newest first.
///
/// Teachers may read anyone's history; a student only their own.
pub async fn list_student_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.is_teacher() && claims.subject_id()? != id {
        return Err(AppError::Forbidden(
            "Cannot view another student's results".to_string(),
        ));
    }

    let results = sqlx::query_as::<_, StudentResultEntry>(
        r#"
        SELECT
            r.id, r.exam_id, e.title AS exam_title, e.folder_id,
            r.score, r.max_score, r.answers, r.submitted_at
        FROM results r
        LEFT JOIN exams e ON r.exam_id = e.id
        WHERE r.student_id = $1
        ORDER BY r.submitted_at DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch student results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
