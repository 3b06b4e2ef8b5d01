// src/grading/reconcile.rs

use std::collections::HashMap;

use crate::{
    grading::{GradingError, engine},
    models::{
        answer::{Answer, AnswerSheet},
        question::{AnswerKey, Question},
    },
};

/// Updated totals and answers after a manual grading pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Regraded {
    pub score: f64,
    pub answers: AnswerSheet,
}

/// Merges teacher-supplied essay scores into a stored answer sheet.
///
/// Auto-graded questions are re-scored against the current answer key of
/// `questions`. Each essay contributes, in order of preference, the score
/// supplied now, the score stored by an earlier pass, or 0. Every supplied
/// score is validated before anything changes, so a rejected call leaves
/// `stored` untouched. Applying the same scores twice gives the same total.
pub fn reconcile(
    questions: &[Question],
    stored: &AnswerSheet,
    essay_scores: &HashMap<i64, f64>,
) -> Result<Regraded, GradingError> {
    for (&question_id, &score) in essay_scores {
        let question = questions
            .iter()
            .find(|q| q.id == question_id && matches!(q.key, AnswerKey::Essay))
            .ok_or(GradingError::NotAnEssay(question_id))?;

        if !score.is_finite() || score < 0.0 || score > question.points {
            return Err(GradingError::ScoreOutOfRange {
                question_id,
                score,
                max: question.points,
            });
        }
    }

    let mut answers = stored.clone();
    let auto = engine::score(questions, &answers).total;
    let mut essays = 0.0;

    for question in questions.iter().filter(|q| matches!(q.key, AnswerKey::Essay)) {
        let previous = match answers.get(&question.id) {
            Some(Answer::Essay { score, .. }) => *score,
            _ => None,
        };

        let awarded = match essay_scores.get(&question.id) {
            Some(&manual) => {
                overlay(&mut answers, question.id, manual);
                manual
            }
            // A key edit may have lowered the weight since the last pass.
            None => previous.unwrap_or(0.0).min(question.points).max(0.0),
        };

        essays += awarded;
    }

    Ok(Regraded {
        score: auto + essays,
        answers,
    })
}

/// Writes `score` into the essay entry, creating a blank one if the student
/// left the question unanswered.
fn overlay(answers: &mut AnswerSheet, question_id: i64, manual: f64) {
    match answers.get_mut(&question_id) {
        Some(Answer::Essay { score, .. }) => *score = Some(manual),
        _ => {
            answers.insert(
                question_id,
                Answer::Essay {
                    essay_text: String::new(),
                    score: Some(manual),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{McqOption, Statement};

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: 1,
                exam_id: 9,
                content: "pH of pure water at 25°C?".to_string(),
                difficulty_level: "Biết".to_string(),
                points: 2.0,
                order_num: 0,
                key: AnswerKey::Mcq {
                    options: vec![
                        McqOption { id: 0, option_text: "1".to_string(), is_correct: false },
                        McqOption { id: 1, option_text: "7".to_string(), is_correct: true },
                    ],
                },
            },
            Question {
                id: 2,
                exam_id: 9,
                content: "Evaluate".to_string(),
                difficulty_level: "Hiểu".to_string(),
                points: 1.0,
                order_num: 1,
                key: AnswerKey::TrueFalse {
                    statements: vec![
                        Statement { statement_text: "a".to_string(), is_correct: true },
                        Statement { statement_text: "b".to_string(), is_correct: false },
                    ],
                },
            },
            Question {
                id: 3,
                exam_id: 9,
                content: "Explain buffer solutions".to_string(),
                difficulty_level: "Vận dụng".to_string(),
                points: 3.0,
                order_num: 2,
                key: AnswerKey::Essay,
            },
        ]
    }

    fn submitted() -> AnswerSheet {
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Mcq { selected_option: Some(1) });
        sheet.insert(2, Answer::TrueFalse { statements: vec![Some(true), Some(true)] });
        sheet
    }

    #[test]
    fn test_unanswered_essay_graded_and_regraded() {
        let questions = questions();
        let scores = HashMap::from([(3, 2.5)]);

        let first = reconcile(&questions, &submitted(), &scores).unwrap();
        assert_eq!(first.score, 2.0 + 0.5 + 2.5);
        assert_eq!(
            first.answers[&3],
            Answer::Essay { essay_text: String::new(), score: Some(2.5) }
        );

        let second = reconcile(&questions, &first.answers, &scores).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_previous_essay_score_is_the_default() {
        let questions = questions();
        let graded = reconcile(&questions, &submitted(), &HashMap::from([(3, 1.0)])).unwrap();

        let untouched = reconcile(&questions, &graded.answers, &HashMap::new()).unwrap();
        assert_eq!(untouched.score, graded.score);
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        let questions = questions();
        for bad in [-0.5, 3.5, f64::NAN] {
            let err = reconcile(&questions, &submitted(), &HashMap::from([(3, bad)])).unwrap_err();
            assert!(matches!(err, GradingError::ScoreOutOfRange { question_id: 3, .. }));
        }

        let full = reconcile(&questions, &submitted(), &HashMap::from([(3, 3.0)])).unwrap();
        assert_eq!(full.score, 5.5);
    }

    #[test]
    fn test_scores_for_non_essays_rejected() {
        let questions = questions();
        assert_eq!(
            reconcile(&questions, &submitted(), &HashMap::from([(1, 1.0)])),
            Err(GradingError::NotAnEssay(1))
        );
        assert_eq!(
            reconcile(&questions, &submitted(), &HashMap::from([(42, 1.0)])),
            Err(GradingError::NotAnEssay(42))
        );
    }

    #[test]
    fn test_regrade_follows_live_key() {
        let mut questions = questions();
        let graded = reconcile(&questions, &submitted(), &HashMap::from([(3, 2.0)])).unwrap();
        assert_eq!(graded.score, 4.5);

        // Teacher fixes the key: option 0 was the right one after all.
        if let AnswerKey::Mcq { options } = &mut questions[0].key {
            options[0].is_correct = true;
            options[1].is_correct = false;
        }

        let regraded = reconcile(&questions, &graded.answers, &HashMap::new()).unwrap();
        assert_eq!(regraded.score, 2.5);
    }
}
