// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::DEFAULT_EXAM_DURATION,
    error::AppError,
    grading::{GradingError, policy},
    models::{
        exam::{CreateExamRequest, Exam, ExamDetail, ExamPaper, ExamSummary, UpdateExamRequest},
        question::{
            AnswerKey, McqOption, PublicQuestion, Question, QuestionRow, Statement,
            UpdateQuestionRequest,
        },
        result::ExamResultEntry,
    },
    store::{
        ScoringStore,
        pg::{EXAM_COLUMNS, QUESTION_COLUMNS, load_questions},
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Splits an answer key into the JSONB `options` and `statements` columns.
fn key_columns(key: &AnswerKey) -> (SqlJson<Vec<McqOption>>, SqlJson<Vec<Statement>>) {
    match key {
        AnswerKey::Mcq { options } => (SqlJson(options.clone()), SqlJson(Vec::new())),
        AnswerKey::TrueFalse { statements } => (SqlJson(Vec::new()), SqlJson(statements.clone())),
        AnswerKey::Essay => (SqlJson(Vec::new()), SqlJson(Vec::new())),
    }
}

/// Lists all exams with their folder name, newest first.
/// Teacher only.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, ExamSummary>(
        r#"
        SELECT
            e.id, e.folder_id, f.name AS folder_name, e.title, e.description,
            e.duration, e.max_attempts, e.deadline, e.shuffle_options, e.source, e.created_at
        FROM exams e
        LEFT JOIN exam_folders f ON e.folder_id = f.id
        ORDER BY e.created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Returns an exam with every question and its answer key.
/// Teacher only.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {} FROM exams WHERE id = $1",
        EXAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let questions = load_questions(&pool, id).await?;

    Ok(Json(ExamDetail { exam, questions }))
}

/// Creates an exam together with its questions in one transaction.
///
/// Question order follows the request; option ids are assigned from
/// authoring order. Teacher only.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let keys = payload
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            q.answer_key()
                .map_err(|msg| AppError::BadRequest(format!("Question {}: {}", idx + 1, msg)))
        })
        .collect::<Result<Vec<AnswerKey>, AppError>>()?;

    let mut tx = pool.begin().await?;

    let exam = sqlx::query_as::<_, Exam>(&format!(
        r#"
        INSERT INTO exams
        (folder_id, title, description, duration, max_attempts, deadline, shuffle_options, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        EXAM_COLUMNS
    ))
    .bind(payload.folder_id)
    .bind(clean_html(&payload.title))
    .bind(clean_html(payload.description.as_deref().unwrap_or_default()))
    .bind(payload.duration.unwrap_or(DEFAULT_EXAM_DURATION))
    .bind(payload.max_attempts)
    .bind(payload.deadline)
    .bind(payload.shuffle_options)
    .bind(payload.source.as_deref().unwrap_or("manual"))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for (order_num, (question, key)) in payload.questions.iter().zip(&keys).enumerate() {
        let (options, statements) = key_columns(key);

        sqlx::query(
            r#"
            INSERT INTO questions
            (exam_id, question_type, content, difficulty_level, points, order_num,
             options, statements)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(exam.id)
        .bind(question.question_type.as_str())
        .bind(clean_html(&question.content))
        .bind(&question.difficulty_level)
        .bind(question.points())
        .bind(order_num as i32)
        .bind(options)
        .bind(statements)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    tx.commit().await?;

    tracing::info!(
        "Created exam {} '{}' with {} questions",
        exam.id,
        exam.title,
        keys.len()
    );

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": exam.id}))))
}

/// Updates exam settings.
/// Teacher only.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.duration.is_none()
        && payload.max_attempts.is_none()
        && payload.deadline.is_none()
        && payload.shuffle_options.is_none()
        && payload.folder_id.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(duration) = payload.duration {
        separated.push("duration = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(max_attempts) = payload.max_attempts {
        separated.push("max_attempts = ");
        separated.push_bind_unseparated(max_attempts);
    }

    if let Some(deadline) = payload.deadline {
        separated.push("deadline = ");
        separated.push_bind_unseparated(deadline);
    }

    if let Some(shuffle_options) = payload.shuffle_options {
        separated.push("shuffle_options = ");
        separated.push_bind_unseparated(shuffle_options);
    }

    if let Some(folder_id) = payload.folder_id {
        separated.push("folder_id = ");
        separated.push_bind_unseparated(folder_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an exam; its questions and results go with it.
/// Teacher only.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists every result of an exam with student details, best score first.
/// Teacher only.
pub async fn list_exam_results(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ExamResultEntry>(
        r#"
        SELECT
            r.id, r.student_id, s.student_code, s.name AS student_name, s.class,
            r.score, r.max_score, r.answers, r.submitted_at
        FROM results r
        LEFT JOIN students s ON r.student_id = s.id
        WHERE r.exam_id = $1
        ORDER BY r.score DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch exam results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Edits a question, including its answer key.
///
/// Existing results are not rescored here; the next manual grading pass
/// of each result picks up the new key. Teacher only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let row = sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {} FROM questions WHERE id = $1",
        QUESTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let mut question = Question::try_from(row).map_err(AppError::InternalServerError)?;
    payload.apply(&mut question).map_err(AppError::BadRequest)?;

    let (options, statements) = key_columns(&question.key);
    sqlx::query(
        r#"
        UPDATE questions
        SET content = $1, difficulty_level = $2, points = $3, options = $4, statements = $5
        WHERE id = $6
        "#,
    )
    .bind(&question.content)
    .bind(&question.difficulty_level)
    .bind(question.points)
    .bind(options)
    .bind(statements)
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Question {} of exam {} updated", id, question.exam_id);

    Ok(Json(question))
}

/// Hands a student the exam paper: questions without answer keys, options
/// shuffled when the exam asks for it.
///
/// Refused once the student can no longer submit (deadline passed or
/// attempts used up).
pub async fn get_paper(
    State(store): State<Arc<dyn ScoringStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.subject_id()?;

    let exam = store.exam(id).await?.ok_or(GradingError::ExamNotFound)?;
    let attempts_used = store.attempt_count(student_id, id).await?;
    policy::admit(&exam, attempts_used, Utc::now())?;

    let questions = store.questions(id).await?;

    Ok(Json(build_paper(exam, &questions, attempts_used)))
}

fn build_paper(exam: Exam, questions: &[Question], attempts_used: i64) -> ExamPaper {
    let mut public: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();

    if exam.shuffle_options {
        let mut rng = rand::rng();
        for question in &mut public {
            if let Some(options) = question.options.as_mut() {
                options.shuffle(&mut rng);
            }
        }
    }

    ExamPaper {
        id: exam.id,
        title: exam.title,
        description: exam.description,
        duration: exam.duration,
        max_attempts: exam.max_attempts,
        deadline: exam.deadline,
        shuffle_options: exam.shuffle_options,
        attempts_used,
        questions: public,
    }
}
