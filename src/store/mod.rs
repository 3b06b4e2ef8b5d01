// src/store/mod.rs

//! Persistence seam of the scoring core.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::{
    grading::{GradingError, reconcile::Regraded},
    models::{
        exam::Exam,
        question::Question,
        result::{ExamResult, NewResult},
    },
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Grading step run inside `ScoringStore::apply_grading`.
pub type GradeFn<'a> =
    dyn Fn(&ExamResult, &[Question]) -> Result<Regraded, GradingError> + Send + Sync + 'a;

/// What the scoring core reads and writes.
///
/// Implementations must make `insert_result` a compare-and-insert: the
/// prior-attempt count it checks against `max_attempts` has to be taken
/// under the same lock or transaction as the insert.
#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn exam(&self, exam_id: i64) -> Result<Option<Exam>, GradingError>;

    /// Questions of the exam with their answer keys, in `order_num` order.
    async fn questions(&self, exam_id: i64) -> Result<Vec<Question>, GradingError>;

    async fn attempt_count(&self, student_id: i64, exam_id: i64) -> Result<i64, GradingError>;

    /// Stores a scored attempt and returns its id, or
    /// `AttemptLimitReached` if the limit filled up in the meantime.
    async fn insert_result(&self, result: NewResult, max_attempts: i32)
    -> Result<i64, GradingError>;

    async fn result(&self, result_id: i64) -> Result<Option<ExamResult>, GradingError>;

    /// Regrades a stored result as one unit: loads it with the exam's
    /// current questions, runs `grade` and writes the outcome back.
    ///
    /// Concurrent calls on the same result are serialized, so every grading
    /// pass sees the answers written by the previous one. Returns the result
    /// as it was before this pass together with the new grading.
    async fn apply_grading(
        &self,
        result_id: i64,
        grade: &GradeFn<'_>,
    ) -> Result<(ExamResult, Regraded), GradingError>;
}
