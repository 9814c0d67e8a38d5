//! The span-extraction capability consumed by the answer extractor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Bounds passed to the extraction capability on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionParams {
    /// Candidate spans requested per passage.
    pub top_k: usize,
    pub max_answer_len: usize,
    pub max_question_len: usize,
    pub max_seq_len: usize,
    /// Overlap stride for passages longer than the model window.
    pub doc_stride: usize,
    /// Whether a no-answer prediction may be returned.
    pub handle_impossible_answer: bool,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_answer_len: 25,
            max_question_len: 64,
            max_seq_len: 256,
            doc_stride: 128,
            handle_impossible_answer: true,
        }
    }
}

/// A candidate answer span returned by the capability.
///
/// `start`/`end` are byte offsets into the passage the span was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanCandidate {
    #[serde(alias = "answer")]
    pub text: String,
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// "(question, passage) -> ranked candidate spans with a calibrated score".
///
/// Implementations must return an empty list, not an error, for empty or
/// very short passages.
#[async_trait]
pub trait SpanExtractor: Send + Sync {
    /// Identifier recorded as `source_model` on produced answers.
    fn model_name(&self) -> &str;

    async fn predict(
        &self,
        question: &str,
        context: &str,
        params: &ExtractionParams,
    ) -> anyhow::Result<Vec<SpanCandidate>>;
}

#[async_trait]
impl<T: SpanExtractor + ?Sized> SpanExtractor for std::sync::Arc<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn predict(
        &self,
        question: &str,
        context: &str,
        params: &ExtractionParams,
    ) -> anyhow::Result<Vec<SpanCandidate>> {
        (**self).predict(question, context, params).await
    }
}
