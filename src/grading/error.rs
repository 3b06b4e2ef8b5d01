// src/grading/error.rs

use std::fmt;

/// Outcomes of the scoring core that are not a successful score.
///
/// Everything except `Store` is an expected rejection the caller can show to
/// the user; `Store` means persistence itself failed.
#[derive(Debug, Clone, PartialEq)]
pub enum GradingError {
    /// The exam deadline lies strictly before the submission time.
    DeadlinePassed,

    /// The student already used every allowed attempt.
    AttemptLimitReached,

    ExamNotFound,

    ResultNotFound,

    /// A manual essay score is negative, above the question weight or not a number.
    ScoreOutOfRange {
        question_id: i64,
        score: f64,
        max: f64,
    },

    /// A manual score was addressed to something other than an essay question of the exam.
    NotAnEssay(i64),

    Store(String),
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::DeadlinePassed => write!(f, "The exam deadline has passed"),
            GradingError::AttemptLimitReached => {
                write!(f, "Maximum number of attempts reached for this exam")
            }
            GradingError::ExamNotFound => write!(f, "Exam not found"),
            GradingError::ResultNotFound => write!(f, "Result not found"),
            GradingError::ScoreOutOfRange {
                question_id,
                score,
                max,
            } => write!(
                f,
                "Score {} for question {} must be between 0 and {}",
                score, question_id, max
            ),
            GradingError::NotAnEssay(id) => {
                write!(f, "Question {} is not an essay question of this exam", id)
            }
            GradingError::Store(msg) => write!(f, "Storage failure: {}", msg),
        }
    }
}

impl std::error::Error for GradingError {}

impl From<sqlx::Error> for GradingError {
    fn from(err: sqlx::Error) -> Self {
        GradingError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for GradingError {
    fn from(err: serde_json::Error) -> Self {
        GradingError::Store(err.to_string())
    }
}
