// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::types::Json;
use tokio::sync::Mutex;

use crate::{
    grading::{GradingError, policy::attempts_exhausted, reconcile::Regraded},
    models::{
        exam::Exam,
        question::Question,
        result::{ExamResult, NewResult},
    },
    store::{GradeFn, ScoringStore},
};

#[derive(Default)]
struct Tables {
    exams: HashMap<i64, Exam>,
    questions: BTreeMap<i64, Question>,
    results: BTreeMap<i64, ExamResult>,
    next_result_id: i64,
}

impl Tables {
    fn exam_questions(&self, exam_id: i64) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .values()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.order_num, q.id));
        questions
    }
}

/// Process-local `ScoringStore`, used by tests and local runs without a
/// database. A single mutex makes count-then-insert and each grading pass
/// atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an exam.
    pub async fn put_exam(&self, exam: Exam) {
        self.tables.lock().await.exams.insert(exam.id, exam);
    }

    /// Adds or replaces a question, e.g. to simulate an answer-key edit.
    pub async fn put_question(&self, question: Question) {
        self.tables
            .lock()
            .await
            .questions
            .insert(question.id, question);
    }

    pub async fn results_for(&self, student_id: i64, exam_id: i64) -> Vec<ExamResult> {
        self.tables
            .lock()
            .await
            .results
            .values()
            .filter(|r| r.student_id == student_id && r.exam_id == exam_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ScoringStore for MemoryStore {
    async fn exam(&self, exam_id: i64) -> Result<Option<Exam>, GradingError> {
        Ok(self.tables.lock().await.exams.get(&exam_id).cloned())
    }

    async fn questions(&self, exam_id: i64) -> Result<Vec<Question>, GradingError> {
        Ok(self.tables.lock().await.exam_questions(exam_id))
    }

    async fn attempt_count(&self, student_id: i64, exam_id: i64) -> Result<i64, GradingError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .results
            .values()
            .filter(|r| r.student_id == student_id && r.exam_id == exam_id)
            .count() as i64)
    }

    async fn insert_result(
        &self,
        result: NewResult,
        max_attempts: i32,
    ) -> Result<i64, GradingError> {
        let mut tables = self.tables.lock().await;

        let prior = tables
            .results
            .values()
            .filter(|r| r.student_id == result.student_id && r.exam_id == result.exam_id)
            .count() as i64;
        if attempts_exhausted(max_attempts, prior) {
            return Err(GradingError::AttemptLimitReached);
        }

        tables.next_result_id += 1;
        let id = tables.next_result_id;
        tables.results.insert(
            id,
            ExamResult {
                id,
                student_id: result.student_id,
                exam_id: result.exam_id,
                score: result.score,
                max_score: result.max_score,
                answers: Json(result.answers),
                submitted_at: result.submitted_at,
            },
        );

        Ok(id)
    }

    async fn result(&self, result_id: i64) -> Result<Option<ExamResult>, GradingError> {
        Ok(self.tables.lock().await.results.get(&result_id).cloned())
    }

    async fn apply_grading(
        &self,
        result_id: i64,
        grade: &GradeFn<'_>,
    ) -> Result<(ExamResult, Regraded), GradingError> {
        let mut tables = self.tables.lock().await;

        let current = tables
            .results
            .get(&result_id)
            .cloned()
            .ok_or(GradingError::ResultNotFound)?;
        let questions = tables.exam_questions(current.exam_id);

        let regraded = grade(&current, &questions)?;

        if let Some(result) = tables.results.get_mut(&result_id) {
            result.score = regraded.score;
            result.answers = Json(regraded.answers.clone());
        }

        Ok((current, regraded))
    }
}
