use async_trait::async_trait;

use crate::answer::{Answer, Label};
use crate::corpus::{CorpusKind, Document, IndexEntry};

/// Persistence for lexical indexes and the corpora they are built over.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Current rows of the corpus behind `kind`.
    async fn load_corpus(&self, kind: CorpusKind) -> anyhow::Result<Vec<Document>>;

    /// Replace the persisted index of `kind` with `entries`.
    async fn save_index(&self, kind: CorpusKind, entries: &[IndexEntry]) -> anyhow::Result<()>;

    async fn load_index(&self, kind: CorpusKind) -> anyhow::Result<Vec<IndexEntry>>;
}

/// Optional audit log of produced answers.
#[async_trait]
pub trait AnswerRepo: Send + Sync {
    async fn insert_answer(&self, answer: &Answer) -> anyhow::Result<()>;

    async fn find_answer(&self, answer_id: &str) -> anyhow::Result<Option<Answer>>;

    /// Set or clear the label of a stored answer. Returns `false` if no
    /// answer has that id.
    async fn update_label(&self, answer_id: &str, label: Option<Label>) -> anyhow::Result<bool>;
}
