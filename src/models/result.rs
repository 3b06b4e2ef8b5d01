// src/models/result.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::models::answer::{AnswerSheet, RawAnswers};

/// Represents the 'results' table in the database.
/// One row per completed attempt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamResult {
    pub id: i64,
    pub student_id: i64,
    pub exam_id: i64,
    pub score: f64,

    /// Sum of all question points at submission time.
    pub max_score: f64,

    /// Canonical answers; essay entries carry their manual score once graded.
    pub answers: Json<AnswerSheet>,

    pub submitted_at: DateTime<Utc>,
}

/// A result that has been scored but not stored yet.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub student_id: i64,
    pub exam_id: i64,
    pub score: f64,
    pub max_score: f64,
    pub answers: AnswerSheet,
    pub submitted_at: DateTime<Utc>,
}

/// Result joined with its exam, for a student's history.
#[derive(Debug, Serialize, FromRow)]
pub struct StudentResultEntry {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: Option<String>,
    pub folder_id: Option<i64>,
    pub score: f64,
    pub max_score: f64,
    pub answers: Json<AnswerSheet>,
    pub submitted_at: DateTime<Utc>,
}

/// Result joined with its student, for an exam's score board.
#[derive(Debug, Serialize, FromRow)]
pub struct ExamResultEntry {
    pub id: i64,
    pub student_id: i64,
    pub student_code: Option<String>,
    pub student_name: Option<String>,
    pub class: Option<String>,
    pub score: f64,
    pub max_score: f64,
    pub answers: Json<AnswerSheet>,
    pub submitted_at: DateTime<Utc>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub exam_id: i64,

    /// User's answers map.
    /// Key: Question ID
    /// Value: the raw answer for that question
    #[serde(default)]
    pub answers: RawAnswers,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmitExamResponse {
    pub result_id: i64,
    pub score: f64,
    pub max_score: f64,
}

/// DTO for manual grading: essay question id to awarded points.
#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    #[serde(default)]
    pub essay_scores: HashMap<i64, f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GradeResponse {
    pub result_id: i64,
    pub score: f64,
    pub max_score: f64,
}
