// src/grading/service.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    grading::{GradingError, engine, normalize::normalize, policy, reconcile::reconcile},
    models::{
        answer::RawAnswers,
        question::Question,
        result::{ExamResult, GradeResponse, NewResult, SubmitExamResponse},
    },
    store::ScoringStore,
};

/// Scores and records one exam attempt.
///
/// * Rejects with `DeadlinePassed` / `AttemptLimitReached` before scoring.
/// * Normalizes the raw answers against the exam's current key.
/// * Persists the result; the attempt limit is checked again atomically
///   with the insert so concurrent submissions cannot overshoot it.
pub async fn submit(
    store: &dyn ScoringStore,
    student_id: i64,
    exam_id: i64,
    raw: &RawAnswers,
    now: DateTime<Utc>,
) -> Result<SubmitExamResponse, GradingError> {
    let exam = store
        .exam(exam_id)
        .await?
        .ok_or(GradingError::ExamNotFound)?;

    let prior = store.attempt_count(student_id, exam_id).await?;
    if let Err(rejection) = policy::admit(&exam, prior, now) {
        tracing::info!(
            "Rejected submission of student {} for exam {}: {}",
            student_id,
            exam_id,
            rejection
        );
        return Err(rejection);
    }

    let questions = store.questions(exam_id).await?;
    let answers = normalize(&questions, raw, exam.shuffle_options);
    let report = engine::score(&questions, &answers);

    let result_id = store
        .insert_result(
            NewResult {
                student_id,
                exam_id,
                score: report.total,
                max_score: report.max_score,
                answers,
                submitted_at: now,
            },
            exam.max_attempts,
        )
        .await?;

    tracing::info!(
        "Student {} submitted exam {} (attempt {}): {}/{}",
        student_id,
        exam_id,
        prior + 1,
        report.total,
        report.max_score
    );

    Ok(SubmitExamResponse {
        result_id,
        score: report.total,
        max_score: report.max_score,
    })
}

/// Applies manual essay scores to a stored result.
///
/// Auto-graded questions are re-scored against the live answer key;
/// `max_score` keeps its submission-time value. Concurrent passes on one
/// result are serialized by the store, so none of them loses another's
/// essay scores.
pub async fn grade(
    store: &dyn ScoringStore,
    result_id: i64,
    essay_scores: &HashMap<i64, f64>,
) -> Result<GradeResponse, GradingError> {
    let (previous, regraded) = store
        .apply_grading(result_id, &|result: &ExamResult, questions: &[Question]| {
            reconcile(questions, &result.answers, essay_scores)
        })
        .await?;

    tracing::info!(
        "Graded result {}: {} -> {}/{}",
        result_id,
        previous.score,
        regraded.score,
        previous.max_score
    );

    Ok(GradeResponse {
        result_id,
        score: regraded.score,
        max_score: previous.max_score,
    })
}
