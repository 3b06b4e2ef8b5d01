// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{config::DEFAULT_QUESTION_POINTS, utils::html::clean_html};

/// The three kinds of question an exam can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    Essay,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Essay => "essay",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(QuestionType::Mcq),
            "true_false" => Ok(QuestionType::TrueFalse),
            "essay" => Ok(QuestionType::Essay),
            other => Err(format!("Unknown question type '{}'", other)),
        }
    }
}

/// One choice of a multiple-choice question.
///
/// `id` is assigned once, as the option's index at authoring time, and is the
/// identity used for shuffling and scoring. Reordering or editing options
/// never reassigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqOption {
    pub id: u32,
    pub option_text: String,
    pub is_correct: bool,
}

/// One independently true or false claim of a true/false block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub statement_text: String,
    pub is_correct: bool,
}

/// Type-specific payload of a question, including its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum AnswerKey {
    Mcq { options: Vec<McqOption> },
    TrueFalse { statements: Vec<Statement> },
    Essay,
}

impl AnswerKey {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKey::Mcq { .. } => QuestionType::Mcq,
            AnswerKey::TrueFalse { .. } => QuestionType::TrueFalse,
            AnswerKey::Essay => QuestionType::Essay,
        }
    }

    /// Id of the first option marked correct, if any.
    pub fn correct_option(&self) -> Option<u32> {
        match self {
            AnswerKey::Mcq { options } => options.iter().find(|o| o.is_correct).map(|o| o.id),
            _ => None,
        }
    }
}

/// A question together with its answer key, as used by the scoring core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,
    pub content: String,
    pub difficulty_level: String,
    pub points: f64,
    pub order_num: i32,
    #[serde(flatten)]
    pub key: AnswerKey,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.key.question_type()
    }
}

/// Represents the 'questions' table in the database.
/// Options and statements are stored as JSONB arrays; only the one matching
/// `question_type` is meaningful.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub exam_id: i64,
    pub question_type: String,
    pub content: String,
    pub difficulty_level: String,
    pub points: f64,
    pub order_num: i32,
    pub options: Json<Vec<McqOption>>,
    pub statements: Json<Vec<Statement>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = String;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let key = match row.question_type.parse::<QuestionType>()? {
            QuestionType::Mcq => AnswerKey::Mcq {
                options: row.options.0,
            },
            QuestionType::TrueFalse => AnswerKey::TrueFalse {
                statements: row.statements.0,
            },
            QuestionType::Essay => AnswerKey::Essay,
        };

        Ok(Question {
            id: row.id,
            exam_id: row.exam_id,
            content: row.content,
            difficulty_level: row.difficulty_level,
            points: row.points,
            order_num: row.order_num,
            key,
        })
    }
}

/// Option as shown to a student: no correctness flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOption {
    pub id: u32,
    pub option_text: String,
}

/// DTO for sending a question to a student (excludes the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_type: QuestionType,
    pub content: String,
    pub difficulty_level: String,
    pub points: f64,
    pub order_num: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PublicOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<String>>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        let (options, statements) = match &q.key {
            AnswerKey::Mcq { options } => (
                Some(
                    options
                        .iter()
                        .map(|o| PublicOption {
                            id: o.id,
                            option_text: o.option_text.clone(),
                        })
                        .collect(),
                ),
                None,
            ),
            AnswerKey::TrueFalse { statements } => (
                None,
                Some(statements.iter().map(|s| s.statement_text.clone()).collect()),
            ),
            AnswerKey::Essay => (None, None),
        };

        PublicQuestion {
            id: q.id,
            question_type: q.question_type(),
            content: q.content.clone(),
            difficulty_level: q.difficulty_level.clone(),
            points: q.points,
            order_num: q.order_num,
            options,
            statements,
        }
    }
}

/// Option as authored. `id` is only honoured when editing an existing question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OptionInput {
    pub id: Option<u32>,
    #[validate(length(min = 1, max = 1000))]
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatementInput {
    #[validate(length(min = 1, max = 1000))]
    pub statement_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[validate(length(min = 1, max = 50))]
    pub difficulty_level: String,
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub points: Option<f64>,
    #[validate(nested)]
    pub options: Option<Vec<OptionInput>>,
    #[validate(nested)]
    pub statements: Option<Vec<StatementInput>>,
}

impl CreateQuestionRequest {
    pub fn points(&self) -> f64 {
        self.points.unwrap_or(DEFAULT_QUESTION_POINTS)
    }

    /// Builds the answer key, assigning option ids from authoring order.
    pub fn answer_key(&self) -> Result<AnswerKey, String> {
        build_key(
            self.question_type,
            self.options.as_deref(),
            self.statements.as_deref(),
            None,
        )
    }
}

/// DTO for editing a question. Fields are optional; a new answer key
/// replaces the old one as a whole.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub difficulty_level: Option<String>,
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub points: Option<f64>,
    #[validate(nested)]
    pub options: Option<Vec<OptionInput>>,
    #[validate(nested)]
    pub statements: Option<Vec<StatementInput>>,
}

impl UpdateQuestionRequest {
    /// Applies the edit to `question`, keeping option ids stable.
    pub fn apply(self, question: &mut Question) -> Result<(), String> {
        if let Some(content) = self.content {
            question.content = clean_html(&content);
        }
        if let Some(level) = self.difficulty_level {
            question.difficulty_level = level;
        }
        if let Some(points) = self.points {
            question.points = points;
        }

        let current = match &question.key {
            AnswerKey::Mcq { options } => options.clone(),
            _ => Vec::new(),
        };

        match (question.question_type(), self.options, self.statements) {
            (_, None, None) => {}
            (QuestionType::Mcq, Some(options), None) => {
                question.key = build_key(
                    QuestionType::Mcq,
                    Some(options.as_slice()),
                    None,
                    Some(current.as_slice()),
                )?;
            }
            (QuestionType::TrueFalse, None, Some(statements)) => {
                question.key = build_key(
                    QuestionType::TrueFalse,
                    None,
                    Some(statements.as_slice()),
                    None,
                )?;
            }
            _ => {
                return Err(format!(
                    "Payload does not match question type '{}'",
                    question.question_type()
                ));
            }
        }

        Ok(())
    }
}

/// Validates and assembles an answer key.
///
/// When `existing` options are given, inputs carrying an `id` must refer to
/// one of them and keep it; inputs without an `id` get fresh ids above every
/// id in use.
fn build_key(
    question_type: QuestionType,
    options: Option<&[OptionInput]>,
    statements: Option<&[StatementInput]>,
    existing: Option<&[McqOption]>,
) -> Result<AnswerKey, String> {
    match question_type {
        QuestionType::Mcq => {
            let inputs = options.ok_or("Multiple-choice questions need options")?;
            if inputs.len() < 2 {
                return Err("Multiple-choice questions need at least two options".to_string());
            }
            if inputs.iter().filter(|o| o.is_correct).count() != 1 {
                return Err("Exactly one option must be marked correct".to_string());
            }

            let options = match existing {
                None => inputs
                    .iter()
                    .enumerate()
                    .map(|(idx, o)| McqOption {
                        id: idx as u32,
                        option_text: clean_html(&o.option_text),
                        is_correct: o.is_correct,
                    })
                    .collect(),
                Some(current) => reassign_ids(inputs, current)?,
            };

            Ok(AnswerKey::Mcq { options })
        }
        QuestionType::TrueFalse => {
            let inputs = statements.ok_or("True/false questions need statements")?;
            if inputs.is_empty() {
                return Err("True/false questions need at least one statement".to_string());
            }

            Ok(AnswerKey::TrueFalse {
                statements: inputs
                    .iter()
                    .map(|s| Statement {
                        statement_text: clean_html(&s.statement_text),
                        is_correct: s.is_correct,
                    })
                    .collect(),
            })
        }
        QuestionType::Essay => {
            if options.is_some() || statements.is_some() {
                return Err("Essay questions take no options or statements".to_string());
            }
            Ok(AnswerKey::Essay)
        }
    }
}

fn reassign_ids(inputs: &[OptionInput], current: &[McqOption]) -> Result<Vec<McqOption>, String> {
    let mut next_id = current.iter().map(|o| o.id + 1).max().unwrap_or(0);
    let mut seen = Vec::with_capacity(inputs.len());
    let mut options = Vec::with_capacity(inputs.len());

    for input in inputs {
        let id = match input.id {
            Some(id) => {
                if !current.iter().any(|o| o.id == id) {
                    return Err(format!("Option id {} does not exist", id));
                }
                id
            }
            None => {
                let id = next_id;
                next_id += 1;
                id
            }
        };
        if seen.contains(&id) {
            return Err(format!("Option id {} used twice", id));
        }
        seen.push(id);

        options.push(McqOption {
            id,
            option_text: clean_html(&input.option_text),
            is_correct: input.is_correct,
        });
    }

    Ok(options)
}
