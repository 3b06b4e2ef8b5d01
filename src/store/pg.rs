// src/store/pg.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    grading::{GradingError, policy::attempts_exhausted, reconcile::Regraded},
    models::{
        exam::Exam,
        question::{Question, QuestionRow},
        result::{ExamResult, NewResult},
    },
    store::{GradeFn, ScoringStore},
};

pub const EXAM_COLUMNS: &str = "id, folder_id, title, description, duration, max_attempts, \
     deadline, shuffle_options, source, created_at";

pub const QUESTION_COLUMNS: &str = "id, exam_id, question_type, content, difficulty_level, \
     points, order_num, options, statements";

const RESULT_COLUMNS: &str = "id, student_id, exam_id, score, max_score, answers, submitted_at";

/// `ScoringStore` backed by the application's PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Advisory lock key for one (exam, student) pair.
/// Collisions between pairs only serialize unrelated submissions.
fn attempt_lock_key(exam_id: i64, student_id: i64) -> i64 {
    ((exam_id & 0xFFFF_FFFF) << 32) | (student_id & 0xFFFF_FFFF)
}

/// Loads the questions of an exam in presentation order.
pub async fn load_questions<'e, E>(executor: E, exam_id: i64) -> Result<Vec<Question>, GradingError>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows: Vec<QuestionRow> = sqlx::query_as(&format!(
        "SELECT {} FROM questions WHERE exam_id = $1 ORDER BY order_num, id",
        QUESTION_COLUMNS
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|row| Question::try_from(row).map_err(GradingError::Store))
        .collect()
}

#[async_trait]
impl ScoringStore for PgStore {
    async fn exam(&self, exam_id: i64) -> Result<Option<Exam>, GradingError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {} FROM exams WHERE id = $1",
            EXAM_COLUMNS
        ))
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    async fn questions(&self, exam_id: i64) -> Result<Vec<Question>, GradingError> {
        load_questions(&self.pool, exam_id).await
    }

    async fn attempt_count(&self, student_id: i64, exam_id: i64) -> Result<i64, GradingError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM results WHERE student_id = $1 AND exam_id = $2")
                .bind(student_id)
                .bind(exam_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn insert_result(
        &self,
        result: NewResult,
        max_attempts: i32,
    ) -> Result<i64, GradingError> {
        let mut tx = self.pool.begin().await?;

        // Held until commit/rollback; concurrent attempts of the same pair queue here.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(attempt_lock_key(result.exam_id, result.student_id))
            .execute(&mut *tx)
            .await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM results WHERE student_id = $1 AND exam_id = $2")
                .bind(result.student_id)
                .bind(result.exam_id)
                .fetch_one(&mut *tx)
                .await?;

        if attempts_exhausted(max_attempts, count) {
            tx.rollback().await?;
            return Err(GradingError::AttemptLimitReached);
        }

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO results (student_id, exam_id, score, max_score, answers, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(result.student_id)
        .bind(result.exam_id)
        .bind(result.score)
        .bind(result.max_score)
        .bind(serde_json::to_value(&result.answers)?)
        .bind(result.submitted_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    async fn result(&self, result_id: i64) -> Result<Option<ExamResult>, GradingError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {} FROM results WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn apply_grading(
        &self,
        result_id: i64,
        grade: &GradeFn<'_>,
    ) -> Result<(ExamResult, Regraded), GradingError> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit; concurrent graders of this result queue here.
        let current = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {} FROM results WHERE id = $1 FOR UPDATE",
            RESULT_COLUMNS
        ))
        .bind(result_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GradingError::ResultNotFound)?;

        let questions = load_questions(&mut *tx, current.exam_id).await?;

        // Dropping the transaction on a rejected grading rolls it back.
        let regraded = grade(&current, &questions)?;

        sqlx::query("UPDATE results SET score = $1, answers = $2 WHERE id = $3")
            .bind(regraded.score)
            .bind(serde_json::to_value(&regraded.answers)?)
            .bind(result_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((current, regraded))
    }
}
