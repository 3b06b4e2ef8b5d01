// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::{CreateQuestionRequest, Question};

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub folder_id: Option<i64>,
    pub title: String,
    pub description: String,

    /// Time allowed to take the exam, in minutes.
    pub duration: i32,

    /// 0 means unlimited.
    pub max_attempts: i32,

    /// Submissions strictly after this instant are refused.
    pub deadline: Option<DateTime<Utc>>,

    /// Whether each attempt shows multiple-choice options in random order.
    pub shuffle_options: bool,

    /// 'manual' or 'ai'.
    pub source: String,

    pub created_at: Option<DateTime<Utc>>,
}

/// Exam row joined with its folder name, for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct ExamSummary {
    pub id: i64,
    pub folder_id: Option<i64>,
    pub folder_name: Option<String>,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub max_attempts: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub shuffle_options: bool,
    pub source: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Full exam including the answer key. Teacher view.
#[derive(Debug, Serialize)]
pub struct ExamDetail {
    pub exam: Exam,
    pub questions: Vec<Question>,
}

/// Exam as handed to a student about to take it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExamPaper {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub max_attempts: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub shuffle_options: bool,
    pub attempts_used: i64,
    pub questions: Vec<crate::models::question::PublicQuestion>,
}

/// DTO for creating an exam, optionally with its questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub folder_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration: Option<i32>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub max_attempts: i32,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shuffle_options: bool,
    #[validate(custom(function = validate_source))]
    pub source: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for updating exam settings. Fields are optional.
///
/// `deadline` distinguishes "absent" (keep) from `null` (clear).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration: Option<i32>,
    #[validate(range(min = 0))]
    pub max_attempts: Option<i32>,
    #[serde(default, with = "double_option")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub shuffle_options: Option<bool>,
    pub folder_id: Option<i64>,
}

fn validate_source(source: &str) -> Result<(), validator::ValidationError> {
    match source {
        "manual" | "ai" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_exam_source")),
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}
