use thiserror::Error;

use crate::corpus::CorpusKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Wiring or configuration problem detected at construction time.
    /// The binary treats this as fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index for the {corpus} corpus is not ready: create it or load it before searching")]
    IndexUnavailable { corpus: CorpusKind },

    #[error("top_n must be a positive integer, got {0}")]
    InvalidTopN(usize),

    #[error("Origin id of question {question_id} has not been set; call set_origin_id first")]
    OriginNotSet { question_id: String },

    #[error("No context resolver registered for {0} questions")]
    MissingResolver(crate::question::Origin),

    #[error("Extraction error: {0}")]
    Extraction(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Answer not found: {0}")]
    UnknownAnswer(String),
}

impl Error {
    /// True for errors that should stop the process instead of failing one request.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
