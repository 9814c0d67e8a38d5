use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::short_hash;

/// The three corpora a lexical index can be built over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    Documentation,
    Questions,
    Faq,
}

impl CorpusKind {
    pub const ALL: [Self; 3] = [Self::Documentation, Self::Questions, Self::Faq];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::Questions => "questions",
            Self::Faq => "faq",
        }
    }
}

impl std::fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CorpusKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documentation" | "docs" => Ok(Self::Documentation),
            "questions" => Ok(Self::Questions),
            "faq" => Ok(Self::Faq),
            _ => Err(anyhow::anyhow!("unknown corpus: {s}")),
        }
    }
}

/// A generic indexable row.
///
/// `columns` holds every field of the row, including the id and the
/// indexed text fields; anything not consumed by the index passes through
/// to answers as provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub columns: Map<String, Value>,
}

impl Document {
    /// Build a document from a row, reading its id from `id_field`.
    ///
    /// Returns `None` if the row has no usable id.
    #[must_use]
    pub fn from_row(columns: Map<String, Value>, id_field: &str) -> Option<Self> {
        let id = columns.get(id_field).and_then(value_as_text)?;
        Some(Self { id, columns })
    }

    /// Text of a column, empty if the column is missing or null.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        self.columns
            .get(field)
            .and_then(value_as_text)
            .unwrap_or_default()
    }

    /// The indexed fields joined by single spaces.
    #[must_use]
    pub fn joined_text(&self, fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| self.text(f))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// One row of a persisted index: a document id and its normalized terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub document_id: String,
    /// Hash of the indexed text the terms were computed from.
    pub fingerprint: String,
    pub terms: Vec<String>,
}

impl IndexEntry {
    const SEPARATOR: &'static str = ", ";

    #[must_use]
    pub fn new(document_id: String, indexed_text: &str, terms: Vec<String>) -> Self {
        Self {
            document_id,
            fingerprint: Self::fingerprint_of(indexed_text),
            terms,
        }
    }

    #[must_use]
    pub fn fingerprint_of(indexed_text: &str) -> String {
        short_hash(indexed_text, 16)
    }

    /// Whether the terms were computed from `indexed_text`.
    #[must_use]
    pub fn matches(&self, indexed_text: &str) -> bool {
        self.fingerprint == Self::fingerprint_of(indexed_text)
    }

    /// Comma-joined form used in the index tables.
    #[must_use]
    pub fn joined_terms(&self) -> String {
        self.terms.join(Self::SEPARATOR)
    }

    #[must_use]
    pub fn from_joined(document_id: String, fingerprint: String, joined: &str) -> Self {
        let terms = joined
            .split(Self::SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect();
        Self {
            document_id,
            fingerprint,
            terms,
        }
    }
}

/// A retrieved row ready for answer extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub document_id: String,
    pub bm25_score: f64,
    /// The user's query as issued to the index.
    pub query: String,
    /// Question shown to the user next to the answer: the query itself for
    /// documentation, the most similar stored question otherwise.
    pub question: String,
    /// Text handed to the extraction stage (or used verbatim for FAQ hits).
    pub context: String,
    /// Non-text columns of the row plus `bm25_score` and `question`.
    pub metadata: Map<String, Value>,
}

/// A curated question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub faq_id: String,
    pub question: String,
    pub answer: String,
    pub author: String,
    pub keywords: String,
    pub created_at: DateTime<Utc>,
}

impl Faq {
    #[must_use]
    pub fn new(question: String, answer: String, author: String, keywords: String) -> Self {
        Self {
            faq_id: format!("faq_{}", uuid::Uuid::now_v7().simple()),
            question,
            answer,
            author,
            keywords,
            created_at: Utc::now(),
        }
    }
}
