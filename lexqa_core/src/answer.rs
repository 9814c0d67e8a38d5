use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::util::user_question_id;

/// `source_model` recorded on answers taken verbatim from the FAQ.
pub const FAQ_SOURCE_MODEL: &str = "faq";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Documentation,
    Questions,
    Faq,
}

impl AnswerOrigin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::Questions => "questions",
            Self::Faq => "faq",
        }
    }
}

impl std::fmt::Display for AnswerOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnswerOrigin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documentation" => Ok(Self::Documentation),
            "questions" => Ok(Self::Questions),
            "faq" => Ok(Self::Faq),
            _ => Err(anyhow::anyhow!("unknown answer origin: {s}")),
        }
    }
}

/// External feedback on an answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Correct,
    Wrong,
}

impl Label {
    /// Stored form: 1 for correct, 0 for wrong.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Correct => 1,
            Self::Wrong => 0,
        }
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Correct),
            0 => Some(Self::Wrong),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub user_question: String,
    pub user_question_id: String,
    pub answer_span: String,
    pub span_start: usize,
    pub span_end: usize,
    /// `None` for FAQ answers, a model probability otherwise.
    pub confidence: Option<f64>,
    pub extended_answer: String,
    pub extended_start: usize,
    pub extended_end: usize,
    pub source_model: String,
    pub origin: AnswerOrigin,
    pub created_at: DateTime<Utc>,
    pub label: Option<Label>,
    pub metadata: Map<String, Value>,
}

/// Parts of an answer that vary per candidate span.
#[derive(Debug, Clone)]
pub struct AnswerSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub extended_text: String,
    pub extended_start: usize,
    pub extended_end: usize,
}

impl Answer {
    #[must_use]
    pub fn new(
        question: &str,
        span: AnswerSpan,
        confidence: Option<f64>,
        source_model: &str,
        origin: AnswerOrigin,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().simple().to_string(),
            user_question: question.to_string(),
            user_question_id: user_question_id(question),
            answer_span: span.text,
            span_start: span.start,
            span_end: span.end,
            confidence,
            extended_answer: span.extended_text,
            extended_start: span.extended_start,
            extended_end: span.extended_end,
            source_model: source_model.to_string(),
            origin,
            created_at: Utc::now(),
            label: None,
            metadata,
        }
    }

    /// Answer for an FAQ hit: the stored answer is used whole, with no confidence.
    #[must_use]
    pub fn from_faq(question: &str, faq_answer: &str, metadata: Map<String, Value>) -> Self {
        let len = faq_answer.len();
        let span = AnswerSpan {
            text: faq_answer.to_string(),
            start: 0,
            end: len,
            extended_text: faq_answer.to_string(),
            extended_start: 0,
            extended_end: len,
        };
        Self::new(
            question,
            span,
            None,
            FAQ_SOURCE_MODEL,
            AnswerOrigin::Faq,
            metadata,
        )
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.confidence {
            Some(c) => write!(f, "answer: {}... , confidence: {c:.4}", self.extended_answer),
            None => write!(f, "answer: {} , confidence: FAQ", self.extended_answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faq_answer_has_no_confidence() {
        let answer = Answer::from_faq("How do I log in?", "Use your certificate.", Map::new());
        assert_eq!(answer.confidence, None);
        assert_eq!(answer.origin, AnswerOrigin::Faq);
        assert_eq!(answer.source_model, FAQ_SOURCE_MODEL);
        assert_eq!(answer.span_end, "Use your certificate.".len());
        assert_eq!(answer.label, None);
    }

    #[test]
    fn label_round_trips_through_storage_form() {
        assert_eq!(Label::from_i32(Label::Correct.as_i32()), Some(Label::Correct));
        assert_eq!(Label::from_i32(Label::Wrong.as_i32()), Some(Label::Wrong));
        assert_eq!(Label::from_i32(3), None);
    }
}
