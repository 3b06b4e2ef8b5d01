// src/models/answer.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Answer to one question as sent by the exam client.
///
/// Which fields matter depends on the question type; the normalizer reads
/// only the ones belonging to the question it is resolving. Fields are read
/// leniently: a value of the wrong shape leaves that one answer unusable
/// instead of failing the whole submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAnswer {
    /// Option tag echoed from the rendered paper (the option id).
    #[serde(default, deserialize_with = "lenient::tag")]
    pub selected_option: Option<i64>,

    /// Option tags in the order the client displayed them, when shuffled.
    #[serde(default, deserialize_with = "lenient::tags")]
    pub option_order: Option<Vec<i64>>,

    /// Statement index (0-based, as JSON object key) to chosen truth value.
    #[serde(default, deserialize_with = "lenient::statements")]
    pub statements: Option<HashMap<usize, bool>>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub essay_text: Option<String>,
}

mod lenient {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Integer tag; anything else reads as no selection.
    pub fn tag<'de, D>(de: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Value::deserialize(de)?.as_i64())
    }

    /// Tag list. A list holding anything but integer tags comes back empty,
    /// which never matches a question's options.
    pub fn tags<'de, D>(de: D) -> Result<Option<Vec<i64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(Value::as_i64)
                    .collect::<Option<Vec<i64>>>()
                    .unwrap_or_default(),
            ),
            _ => Some(Vec::new()),
        })
    }

    /// Statement choices; entries that are not index to boolean are skipped.
    pub fn statements<'de, D>(de: D) -> Result<Option<HashMap<usize, bool>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::Object(entries) => Some(
                entries
                    .iter()
                    .filter_map(|(idx, value)| Some((idx.parse().ok()?, value.as_bool()?)))
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(de)? {
            Value::String(text) => Some(text),
            _ => None,
        })
    }
}

/// Raw submission payload: question id to raw answer.
pub type RawAnswers = HashMap<i64, RawAnswer>;

/// Canonical answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    Mcq {
        /// Id of the chosen option, `None` when nothing usable was chosen.
        selected_option: Option<u32>,
    },
    TrueFalse {
        /// One entry per statement of the question; `None` is unanswered.
        statements: Vec<Option<bool>>,
    },
    Essay {
        essay_text: String,
        /// Manual score overlaid by a teacher.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
    },
}

/// Canonical answers of one attempt, keyed by question id.
/// This is the durable `results.answers` record.
pub type AnswerSheet = BTreeMap<i64, Answer>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_answers_accept_string_keys() {
        let payload = json!({
            "11": { "selected_option": 2, "option_order": [3, 2, 0, 1] },
            "12": { "statements": { "0": true, "3": false } },
            "13": { "essay_text": "NaCl dissolves" }
        });

        let raw: RawAnswers = serde_json::from_value(payload).unwrap();
        assert_eq!(raw[&11].selected_option, Some(2));
        assert_eq!(raw[&11].option_order.as_deref(), Some(&[3, 2, 0, 1][..]));
        let statements = raw[&12].statements.as_ref().unwrap();
        assert_eq!(statements.get(&0), Some(&true));
        assert_eq!(statements.get(&3), Some(&false));
        assert_eq!(raw[&13].essay_text.as_deref(), Some("NaCl dissolves"));
    }

    #[test]
    fn test_malformed_fields_spoil_only_their_answer() {
        let payload = json!({
            "10": { "selected_option": 1, "option_order": [2, "x", 0] },
            "11": { "selected_option": "two", "option_order": null },
            "12": { "statements": { "0": true, "1": "yes", "first": false } },
            "13": { "essay_text": "Fe + CuSO4" },
            "14": { "essay_text": 42 }
        });

        let raw: RawAnswers = serde_json::from_value(payload).unwrap();
        assert_eq!(raw[&10].selected_option, Some(1));
        assert_eq!(raw[&10].option_order.as_deref(), Some(&[][..]));
        assert_eq!(raw[&11].selected_option, None);
        assert_eq!(raw[&11].option_order, None);
        assert_eq!(raw[&12].statements, Some(HashMap::from([(0, true)])));
        assert_eq!(raw[&13].essay_text.as_deref(), Some("Fe + CuSO4"));
        assert_eq!(raw[&14].essay_text, None);
    }

    #[test]
    fn test_graded_essay_keeps_score_in_stored_sheet() {
        let mut sheet = AnswerSheet::new();
        sheet.insert(
            5,
            Answer::Essay {
                essay_text: "Redox".to_string(),
                score: Some(2.5),
            },
        );
        sheet.insert(
            6,
            Answer::TrueFalse {
                statements: vec![Some(true), None],
            },
        );

        let stored = serde_json::to_value(&sheet).unwrap();
        assert_eq!(stored["5"]["score"], json!(2.5));
        assert_eq!(stored["6"]["statements"], json!([true, null]));

        let reloaded: AnswerSheet = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, sheet);
    }
}
