// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    grading::service,
    models::result::{GradeRequest, SubmitExamRequest},
    store::ScoringStore,
    utils::jwt::Claims,
};

/// Submits a student's exam answers and records the scored attempt.
///
/// * The student is taken from the token, never from the body.
/// * Deadline and attempt limit are enforced before scoring.
/// * Returns 201 with the result id, score and max score.
pub async fn submit_result(
    State(store): State<Arc<dyn ScoringStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.subject_id()?;

    let response = service::submit(
        store.as_ref(),
        student_id,
        req.exam_id,
        &req.answers,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Applies manual essay scores to a result.
/// Teacher only.
pub async fn grade_result(
    State(store): State<Arc<dyn ScoringStore>>,
    Path(id): Path<i64>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = service::grade(store.as_ref(), id, &req.essay_scores).await?;

    Ok(Json(response))
}
