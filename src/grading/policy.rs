// src/grading/policy.rs

use chrono::{DateTime, Utc};

use crate::{grading::GradingError, models::exam::Exam};

/// Decides whether a student may submit another attempt.
///
/// `prior_attempts` is the number of results the student already has for
/// this exam. The deadline is inclusive: submitting at exactly `deadline`
/// is admitted.
pub fn admit(exam: &Exam, prior_attempts: i64, now: DateTime<Utc>) -> Result<(), GradingError> {
    if let Some(deadline) = exam.deadline {
        if now > deadline {
            return Err(GradingError::DeadlinePassed);
        }
    }

    if attempts_exhausted(exam.max_attempts, prior_attempts) {
        return Err(GradingError::AttemptLimitReached);
    }

    Ok(())
}

/// True when `max_attempts` is a real limit and `prior_attempts` reached it.
pub fn attempts_exhausted(max_attempts: i32, prior_attempts: i64) -> bool {
    max_attempts > 0 && prior_attempts >= i64::from(max_attempts)
}
