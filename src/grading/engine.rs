// src/grading/engine.rs

use serde::Serialize;

use crate::models::{
    answer::{Answer, AnswerSheet},
    question::{AnswerKey, Question, QuestionType},
};

/// Points awarded for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionScore {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub awarded: f64,
    pub points: f64,
}

/// Outcome of scoring one answer sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub questions: Vec<QuestionScore>,
    pub total: f64,
    pub max_score: f64,
}

/// Scores `answers` against the answer key of `questions`.
///
/// Essays always score 0 here; their points still count toward
/// `max_score`, which depends only on the questions.
pub fn score(questions: &[Question], answers: &AnswerSheet) -> ScoreReport {
    let scores: Vec<QuestionScore> = questions
        .iter()
        .map(|q| QuestionScore {
            question_id: q.id,
            question_type: q.question_type(),
            awarded: clamp(question_score(q, answers.get(&q.id)), q.points),
            points: q.points,
        })
        .collect();

    ScoreReport {
        total: scores.iter().map(|s| s.awarded).sum(),
        max_score: max_score(questions),
        questions: scores,
    }
}

/// Sum of all question weights.
pub fn max_score(questions: &[Question]) -> f64 {
    questions.iter().map(|q| q.points).sum()
}

fn question_score(question: &Question, answer: Option<&Answer>) -> f64 {
    match (&question.key, answer) {
        (AnswerKey::Mcq { .. }, Some(Answer::Mcq { selected_option })) => {
            match (selected_option, question.key.correct_option()) {
                (Some(chosen), Some(correct)) if *chosen == correct => question.points,
                _ => 0.0,
            }
        }
        (AnswerKey::TrueFalse { statements }, Some(Answer::TrueFalse { statements: chosen })) => {
            if statements.is_empty() {
                return 0.0;
            }
            let correct = statements
                .iter()
                .enumerate()
                .filter(|(idx, s)| chosen.get(*idx).copied().flatten() == Some(s.is_correct))
                .count();
            question.points * correct as f64 / statements.len() as f64
        }
        // Essays are graded by hand; missing or mismatched answers earn nothing.
        _ => 0.0,
    }
}

fn clamp(awarded: f64, points: f64) -> f64 {
    if awarded.is_nan() || awarded < 0.0 {
        0.0
    } else if awarded > points {
        points
    } else {
        awarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{McqOption, Statement};

    fn mcq(id: i64, points: f64, correct: u32, count: u32) -> Question {
        Question {
            id,
            exam_id: 1,
            content: "Atomic number of carbon?".to_string(),
            difficulty_level: "Biết".to_string(),
            points,
            order_num: 0,
            key: AnswerKey::Mcq {
                options: (0..count)
                    .map(|oid| McqOption {
                        id: oid,
                        option_text: format!("{}", oid + 5),
                        is_correct: oid == correct,
                    })
                    .collect(),
            },
        }
    }

    fn true_false(id: i64, points: f64, key: &[bool]) -> Question {
        Question {
            id,
            exam_id: 1,
            content: "Evaluate".to_string(),
            difficulty_level: "Hiểu".to_string(),
            points,
            order_num: 1,
            key: AnswerKey::TrueFalse {
                statements: key
                    .iter()
                    .map(|&is_correct| Statement {
                        statement_text: String::new(),
                        is_correct,
                    })
                    .collect(),
            },
        }
    }

    fn essay(id: i64, points: f64) -> Question {
        Question {
            id,
            exam_id: 1,
            content: "Explain".to_string(),
            difficulty_level: "Vận dụng".to_string(),
            points,
            order_num: 2,
            key: AnswerKey::Essay,
        }
    }

    #[test]
    fn test_mixed_exam_scenario() {
        let questions = vec![
            mcq(1, 2.0, 1, 4),
            true_false(2, 1.0, &[true, false, true, false]),
        ];
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Mcq { selected_option: Some(1) });
        sheet.insert(
            2,
            Answer::TrueFalse {
                statements: vec![Some(true), Some(false), Some(false), Some(true)],
            },
        );

        let report = score(&questions, &sheet);
        assert_eq!(report.questions[0].awarded, 2.0);
        assert_eq!(report.questions[1].awarded, 0.5);
        assert_eq!(report.total, 2.5);
        assert_eq!(report.max_score, 3.0);
    }

    #[test]
    fn test_three_of_four_statements_earn_three_quarters() {
        let questions = vec![true_false(2, 1.0, &[true, false, true, false])];
        let mut sheet = AnswerSheet::new();
        sheet.insert(
            2,
            Answer::TrueFalse {
                statements: vec![Some(true), Some(false), Some(false), Some(false)],
            },
        );

        assert_eq!(score(&questions, &sheet).total, 0.75);
    }

    #[test]
    fn test_mcq_is_all_or_nothing() {
        let questions = vec![mcq(1, 2.0, 2, 4)];

        for chosen in 0..4 {
            let mut sheet = AnswerSheet::new();
            sheet.insert(1, Answer::Mcq { selected_option: Some(chosen) });
            let expected = if chosen == 2 { 2.0 } else { 0.0 };
            assert_eq!(score(&questions, &sheet).total, expected);
        }

        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Mcq { selected_option: None });
        assert_eq!(score(&questions, &sheet).total, 0.0);
    }

    #[test]
    fn test_first_correct_option_wins() {
        let mut question = mcq(1, 1.0, 0, 3);
        if let AnswerKey::Mcq { options } = &mut question.key {
            options[2].is_correct = true;
        }
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Mcq { selected_option: Some(2) });
        assert_eq!(score(&[question], &sheet).total, 0.0);
    }

    #[test]
    fn test_true_false_is_proportional() {
        let question = true_false(1, 2.0, &[true, true, false, false]);
        let cases = [
            (vec![Some(false), Some(false), Some(true), Some(true)], 0.0),
            (vec![Some(true), Some(false), Some(true), Some(true)], 0.5),
            (vec![Some(true), Some(true), Some(true), None], 1.0),
            (vec![Some(true), Some(true), Some(false), Some(true)], 1.5),
            (vec![Some(true), Some(true), Some(false), Some(false)], 2.0),
        ];

        for (statements, expected) in cases {
            let mut sheet = AnswerSheet::new();
            sheet.insert(1, Answer::TrueFalse { statements });
            assert_eq!(score(std::slice::from_ref(&question), &sheet).total, expected);
        }
    }

    #[test]
    fn test_unanswered_statement_counts_wrong() {
        let question = true_false(1, 3.0, &[false, false, false]);
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::TrueFalse { statements: vec![None, None, None] });
        assert_eq!(score(&[question], &sheet).total, 0.0);
    }

    #[test]
    fn test_max_score_ignores_answers() {
        let questions = vec![mcq(1, 2.0, 0, 4), true_false(2, 1.5, &[true]), essay(3, 3.0)];

        let empty = score(&questions, &AnswerSheet::new());
        assert_eq!(empty.total, 0.0);
        assert_eq!(empty.max_score, 6.5);

        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Mcq { selected_option: Some(0) });
        sheet.insert(3, Answer::Essay { essay_text: "x".to_string(), score: Some(3.0) });
        let partial = score(&questions, &sheet);
        assert_eq!(partial.total, 2.0);
        assert_eq!(partial.max_score, 6.5);
    }

    #[test]
    fn test_mismatched_variant_scores_zero() {
        let questions = vec![mcq(1, 2.0, 0, 2)];
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::TrueFalse { statements: vec![Some(true)] });
        assert_eq!(score(&questions, &sheet).total, 0.0);
    }

    #[test]
    fn test_true_false_without_statements_scores_zero() {
        let question = true_false(1, 1.0, &[]);
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::TrueFalse { statements: vec![] });
        let report = score(&[question], &sheet);
        assert_eq!(report.total, 0.0);
        assert_eq!(report.max_score, 1.0);
    }
}
