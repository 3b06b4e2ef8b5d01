// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        student::{Student, StudentLoginRequest},
        teacher::{Teacher, TeacherLoginRequest},
    },
    utils::{
        hash::verify_password,
        jwt::{ROLE_STUDENT, ROLE_TEACHER, sign_jwt},
    },
};

/// Authenticates a teacher and returns a JWT token.
///
/// Verifies the username and Argon2 password hash.
pub async fn teacher_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<TeacherLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let teacher = sqlx::query_as::<_, Teacher>(
        "SELECT id, username, password, name FROM teachers WHERE username = $1",
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Teacher login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &teacher.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        teacher.id,
        ROLE_TEACHER,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "teacher": teacher
    })))
}

/// Authenticates a student by login code and returns a JWT token.
pub async fn student_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<StudentLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student = sqlx::query_as::<_, Student>(
        "SELECT id, student_code, name, class, created_at FROM students WHERE student_code = $1",
    )
    .bind(&payload.student_code)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Student login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Student not found".to_string()))?;

    let token = sign_jwt(
        student.id,
        ROLE_STUDENT,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "student": student
    })))
}
