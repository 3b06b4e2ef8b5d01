// src/grading/normalize.rs

use crate::models::{
    answer::{Answer, AnswerSheet, RawAnswer, RawAnswers},
    question::{AnswerKey, McqOption, Question},
};

/// Converts a raw submission into canonical answers for `questions`.
///
/// Never fails: a raw answer that cannot be resolved against the key
/// (corrupted shuffle metadata, unknown option, out-of-range statement)
/// degrades to "no answer" for that item. Questions without a raw answer
/// get no entry, and raw answers for ids outside `questions` are dropped.
pub fn normalize(questions: &[Question], raw: &RawAnswers, shuffled: bool) -> AnswerSheet {
    let mut sheet = AnswerSheet::new();

    for question in questions {
        let Some(answer) = raw.get(&question.id) else {
            continue;
        };

        let canonical = match &question.key {
            AnswerKey::Mcq { options } => Answer::Mcq {
                selected_option: resolve_option(question.id, options, answer, shuffled),
            },
            AnswerKey::TrueFalse { statements } => Answer::TrueFalse {
                statements: dense_statements(statements.len(), answer),
            },
            AnswerKey::Essay => Answer::Essay {
                essay_text: answer.essay_text.clone().unwrap_or_default(),
                score: None,
            },
        };

        sheet.insert(question.id, canonical);
    }

    let dropped = raw
        .keys()
        .filter(|id| !questions.iter().any(|q| q.id == **id))
        .count();
    if dropped > 0 {
        tracing::warn!("Ignored {} answers for questions outside the exam", dropped);
    }

    sheet
}

/// Maps the echoed option tag back to a stable option id.
fn resolve_option(
    question_id: i64,
    options: &[McqOption],
    answer: &RawAnswer,
    shuffled: bool,
) -> Option<u32> {
    let selected = answer.selected_option?;

    if shuffled {
        if let Some(order) = &answer.option_order {
            if !is_permutation_of(order, options) || !order.contains(&selected) {
                tracing::warn!(
                    "Discarding answer to question {}: shuffle metadata does not match its options",
                    question_id
                );
                return None;
            }
        }
    }

    let id = u32::try_from(selected).ok()?;
    if options.iter().any(|o| o.id == id) {
        Some(id)
    } else {
        tracing::warn!(
            "Discarding answer to question {}: option {} does not exist",
            question_id,
            selected
        );
        None
    }
}

fn is_permutation_of(order: &[i64], options: &[McqOption]) -> bool {
    if order.len() != options.len() {
        return false;
    }
    let mut tags = order.to_vec();
    tags.sort_unstable();
    tags.dedup();
    tags.len() == options.len()
        && tags
            .iter()
            .all(|tag| options.iter().any(|o| i64::from(o.id) == *tag))
}

fn dense_statements(count: usize, answer: &RawAnswer) -> Vec<Option<bool>> {
    let mut dense = vec![None; count];
    if let Some(chosen) = &answer.statements {
        for (&idx, &value) in chosen {
            if let Some(slot) = dense.get_mut(idx) {
                *slot = Some(value);
            }
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Statement;
    use std::collections::HashMap;

    fn mcq(id: i64, ids: &[u32]) -> Question {
        Question {
            id,
            exam_id: 1,
            content: "Which element is a halogen?".to_string(),
            difficulty_level: "Biết".to_string(),
            points: 1.0,
            order_num: 0,
            key: AnswerKey::Mcq {
                options: ids
                    .iter()
                    .map(|&oid| McqOption {
                        id: oid,
                        option_text: format!("option {}", oid),
                        is_correct: oid == 0,
                    })
                    .collect(),
            },
        }
    }

    fn true_false(id: i64, n: usize) -> Question {
        Question {
            id,
            exam_id: 1,
            content: "Evaluate the statements".to_string(),
            difficulty_level: "Hiểu".to_string(),
            points: 1.0,
            order_num: 1,
            key: AnswerKey::TrueFalse {
                statements: (0..n)
                    .map(|i| Statement {
                        statement_text: format!("s{}", i),
                        is_correct: i % 2 == 0,
                    })
                    .collect(),
            },
        }
    }

    fn selected(tag: i64, order: Option<Vec<i64>>) -> RawAnswer {
        RawAnswer {
            selected_option: Some(tag),
            option_order: order,
            ..Default::default()
        }
    }

    #[test]
    fn test_shuffled_selection_resolves_to_option_id() {
        let questions = vec![mcq(1, &[0, 1, 2, 3])];
        let raw = HashMap::from([(1, selected(2, Some(vec![3, 2, 0, 1])))]);

        let sheet = normalize(&questions, &raw, true);
        assert_eq!(sheet[&1], Answer::Mcq { selected_option: Some(2) });
    }

    #[test]
    fn test_corrupted_shuffle_metadata_becomes_no_answer() {
        let questions = vec![mcq(1, &[0, 1, 2, 3]), mcq(2, &[0, 1, 2, 3])];
        let raw = HashMap::from([
            // Duplicate tag, not a permutation.
            (1, selected(2, Some(vec![2, 2, 0, 1]))),
            // Selection not among the displayed tags.
            (2, selected(3, Some(vec![0, 1, 2]))),
        ]);

        let sheet = normalize(&questions, &raw, true);
        assert_eq!(sheet[&1], Answer::Mcq { selected_option: None });
        assert_eq!(sheet[&2], Answer::Mcq { selected_option: None });
    }

    #[test]
    fn test_unknown_or_negative_option_becomes_no_answer() {
        let questions = vec![mcq(1, &[0, 1]), mcq(2, &[0, 1])];
        let raw = HashMap::from([(1, selected(7, None)), (2, selected(-1, None))]);

        let sheet = normalize(&questions, &raw, false);
        assert_eq!(sheet[&1], Answer::Mcq { selected_option: None });
        assert_eq!(sheet[&2], Answer::Mcq { selected_option: None });
    }

    #[test]
    fn test_order_ignored_when_exam_not_shuffled() {
        let questions = vec![mcq(1, &[0, 1, 2])];
        let raw = HashMap::from([(1, selected(1, Some(vec![9, 9])))]);

        let sheet = normalize(&questions, &raw, false);
        assert_eq!(sheet[&1], Answer::Mcq { selected_option: Some(1) });
    }

    #[test]
    fn test_statements_are_dense_and_bounded() {
        let questions = vec![true_false(4, 4)];
        let raw = HashMap::from([(
            4,
            RawAnswer {
                statements: Some(HashMap::from([(0, true), (2, false), (9, true)])),
                ..Default::default()
            },
        )]);

        let sheet = normalize(&questions, &raw, false);
        assert_eq!(
            sheet[&4],
            Answer::TrueFalse {
                statements: vec![Some(true), None, Some(false), None]
            }
        );
    }

    #[test]
    fn test_missing_and_foreign_answers() {
        let questions = vec![mcq(1, &[0, 1]), true_false(2, 2)];
        let raw = HashMap::from([(99, selected(0, None))]);

        let sheet = normalize(&questions, &raw, false);
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_essay_passes_text_through() {
        let essay = Question {
            id: 3,
            exam_id: 1,
            content: "Describe the Haber process".to_string(),
            difficulty_level: "Vận dụng".to_string(),
            points: 3.0,
            order_num: 2,
            key: AnswerKey::Essay,
        };
        let raw = HashMap::from([(
            3,
            RawAnswer {
                essay_text: Some("N2 + 3H2 <=> 2NH3".to_string()),
                ..Default::default()
            },
        )]);

        let sheet = normalize(&[essay], &raw, false);
        assert_eq!(
            sheet[&3],
            Answer::Essay {
                essay_text: "N2 + 3H2 <=> 2NH3".to_string(),
                score: None
            }
        );
    }
}
