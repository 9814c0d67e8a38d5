//! Retrieval, extraction and fusion across the three corpora.

use lexqa_core::{Answer, AnswerOrigin, CorpusKind, Error, Passage, Result, SpanExtractor};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extractor::{AnswerExtractor, sort_by_confidence};
use crate::index::LexicalIndex;

/// Per-request sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskOptions {
    /// Extracted answers kept after fusion. FAQ answers come on top of these.
    pub top_k: usize,
    pub num_faq: usize,
    pub num_questions: usize,
    pub num_docs: usize,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            num_faq: 3,
            num_questions: 10,
            num_docs: 10,
        }
    }
}

/// Composes one extractor with the FAQ, question and documentation indexes.
pub struct AnswerOrchestrator<E> {
    extractor: AnswerExtractor<E>,
    faq: LexicalIndex,
    questions: LexicalIndex,
    docs: LexicalIndex,
}

impl<E: SpanExtractor> AnswerOrchestrator<E> {
    /// Wire the pipeline.
    ///
    /// Every index must serve the corpus of its slot and be ready; anything
    /// else is a [`Error::Config`].
    pub fn new(
        extractor: AnswerExtractor<E>,
        faq: LexicalIndex,
        questions: LexicalIndex,
        docs: LexicalIndex,
    ) -> Result<Self> {
        check_role(&faq, CorpusKind::Faq)?;
        check_role(&questions, CorpusKind::Questions)?;
        check_role(&docs, CorpusKind::Documentation)?;
        info!(
            "Orchestrator ready: model {}, {} faq, {} questions, {} docs",
            extractor.model_name(),
            faq.len(),
            questions.len(),
            docs.len()
        );
        Ok(Self {
            extractor,
            faq,
            questions,
            docs,
        })
    }

    /// Ranked answers for `query`: extracted answers by confidence (at most
    /// `top_k`), then every FAQ hit.
    ///
    /// An empty result means nothing matched; it is not an error.
    pub async fn get_answers(&self, query: &str, options: AskOptions) -> Result<Vec<Answer>> {
        let faq_answers: Vec<Answer> = retrieve(&self.faq, query, options.num_faq)?
            .into_iter()
            .map(|p| Answer::from_faq(query, &p.context, p.metadata))
            .collect();

        let question_passages = retrieve(&self.questions, query, options.num_questions)?;
        let doc_passages = retrieve(&self.docs, query, options.num_docs)?;

        let (mut question_answers, mut doc_answers) = tokio::join!(
            self.extractor
                .extract(query, &question_passages, Some(options.top_k)),
            self.extractor.extract(query, &doc_passages, Some(options.top_k)),
        );
        tag(&mut question_answers, AnswerOrigin::Questions);
        tag(&mut doc_answers, AnswerOrigin::Documentation);

        info!(
            "Answers for {:?}: {} faq, {} questions, {} documentation",
            query,
            faq_answers.len(),
            question_answers.len(),
            doc_answers.len()
        );

        let mut answers = question_answers;
        answers.extend(doc_answers);
        sort_by_confidence(&mut answers);
        answers.truncate(options.top_k);
        answers.extend(faq_answers);
        Ok(answers)
    }
}

fn check_role(index: &LexicalIndex, expected: CorpusKind) -> Result<()> {
    if index.kind() != expected {
        return Err(Error::Config(format!(
            "the {expected} slot was given an index over the {} corpus",
            index.kind()
        )));
    }
    if !index.is_ready() {
        return Err(Error::Config(format!(
            "the {expected} index must be created or loaded before answering"
        )));
    }
    Ok(())
}

/// `top_n` hits from `index`, or nothing when the corpus is switched off.
fn retrieve(index: &LexicalIndex, query: &str, top_n: usize) -> Result<Vec<Passage>> {
    if top_n == 0 {
        return Ok(Vec::new());
    }
    index.search(query, top_n)
}

fn tag(answers: &mut [Answer], origin: AnswerOrigin) {
    for answer in answers {
        answer.origin = origin;
    }
}
