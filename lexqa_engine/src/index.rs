//! Lexical search indexes over the documentation, question and FAQ corpora.
//!
//! One [`LexicalIndex`] type serves all three corpora; an [`IndexSpec`]
//! picks the id column, the indexed columns and where a hit's extraction
//! context comes from.

use std::collections::HashMap;

use lexqa_core::{CorpusKind, Document, Error, IndexEntry, IndexStore, Passage, Result};
use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::bm25::{Bm25, Bm25Params};
use crate::normalize::TextNormalizer;

/// Where the `context` handed to extraction comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// The indexed columns themselves: the document is its own context.
    IndexedText,
    /// A stored column, e.g. a question's resolved thread or an FAQ answer.
    Column(String),
}

/// Column layout of one corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub kind: CorpusKind,
    pub id_field: String,
    pub indexed_fields: Vec<String>,
    /// Column shown as the hit's question. `None` shows the query itself.
    pub question_field: Option<String>,
    pub context: ContextSource,
    /// Text-bearing columns kept out of passage metadata.
    pub text_fields: Vec<String>,
}

impl IndexSpec {
    #[must_use]
    pub fn documentation() -> Self {
        Self {
            kind: CorpusKind::Documentation,
            id_field: "doc_id".into(),
            indexed_fields: vec!["doc_type".into(), "body".into()],
            question_field: None,
            context: ContextSource::IndexedText,
            text_fields: vec!["body".into()],
        }
    }

    #[must_use]
    pub fn questions() -> Self {
        Self {
            kind: CorpusKind::Questions,
            id_field: "question_id".into(),
            indexed_fields: vec!["question".into()],
            question_field: Some("question".into()),
            context: ContextSource::Column("context".into()),
            text_fields: vec!["context".into()],
        }
    }

    #[must_use]
    pub fn faq() -> Self {
        Self {
            kind: CorpusKind::Faq,
            id_field: "faq_id".into(),
            indexed_fields: vec!["keywords".into(), "question".into()],
            question_field: Some("question".into()),
            context: ContextSource::Column("answer".into()),
            text_fields: vec!["answer".into()],
        }
    }

    #[must_use]
    pub fn for_kind(kind: CorpusKind) -> Self {
        match kind {
            CorpusKind::Documentation => Self::documentation(),
            CorpusKind::Questions => Self::questions(),
            CorpusKind::Faq => Self::faq(),
        }
    }

    fn context_of(&self, doc: &Document) -> String {
        match &self.context {
            ContextSource::IndexedText => doc.joined_text(&self.indexed_fields),
            ContextSource::Column(field) => doc.text(field),
        }
    }

    fn metadata_of(&self, doc: &Document) -> Map<String, Value> {
        doc.columns
            .iter()
            .filter(|(k, _)| !self.text_fields.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug)]
enum IndexState {
    Uninitialized,
    Ready(ReadyIndex),
}

#[derive(Debug)]
struct ReadyIndex {
    corpus: Vec<Document>,
    scorer: Bm25,
}

/// A BM25 index over one corpus snapshot.
#[derive(Debug)]
pub struct LexicalIndex {
    spec: IndexSpec,
    params: Bm25Params,
    normalizer: TextNormalizer,
    state: IndexState,
}

impl LexicalIndex {
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self::with_params(spec, Bm25Params::default())
    }

    #[must_use]
    pub fn with_params(spec: IndexSpec, params: Bm25Params) -> Self {
        Self {
            spec,
            params,
            normalizer: TextNormalizer::new(),
            state: IndexState::Uninitialized,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CorpusKind {
        self.spec.kind
    }

    #[must_use]
    pub const fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, IndexState::Ready(_))
    }

    /// Number of indexed documents, 0 before the index is ready.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            IndexState::Uninitialized => 0,
            IndexState::Ready(ready) => ready.corpus.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized terms of every document, in corpus order.
    #[must_use]
    pub fn build_entries(&self, corpus: &[Document]) -> Vec<IndexEntry> {
        corpus
            .par_iter()
            .map(|doc| {
                let text = doc.joined_text(&self.spec.indexed_fields);
                let terms = self.normalizer.terms(&text);
                IndexEntry::new(doc.id.clone(), &text, terms)
            })
            .collect()
    }

    /// Index the current corpus in `store`, persist the terms and become ready.
    ///
    /// The previous state is kept if persisting fails.
    pub async fn create_index<S>(&mut self, store: &S) -> Result<()>
    where
        S: IndexStore + ?Sized,
    {
        let corpus = store
            .load_corpus(self.spec.kind)
            .await
            .map_err(Error::Storage)?;
        let entries = self.build_entries(&corpus);
        store
            .save_index(self.spec.kind, &entries)
            .await
            .map_err(Error::Storage)?;
        self.hydrate(corpus, &entries);
        Ok(())
    }

    /// Rebuild the scorer from persisted terms.
    ///
    /// Fails without touching the current state if the persisted terms no
    /// longer match the corpus rows, either because rows were added or
    /// removed or because an indexed column was edited.
    pub async fn load_index<S>(&mut self, store: &S) -> Result<()>
    where
        S: IndexStore + ?Sized,
    {
        let corpus = store
            .load_corpus(self.spec.kind)
            .await
            .map_err(Error::Storage)?;
        let entries = store
            .load_index(self.spec.kind)
            .await
            .map_err(Error::Storage)?;

        let mut by_id: HashMap<&str, &IndexEntry> = entries
            .iter()
            .map(|e| (e.document_id.as_str(), e))
            .collect();
        let mut aligned = Vec::with_capacity(corpus.len());
        for doc in &corpus {
            let Some(entry) = by_id.remove(doc.id.as_str()) else {
                return Err(self.stale(entries.len(), corpus.len()));
            };
            if !entry.matches(&doc.joined_text(&self.spec.indexed_fields)) {
                return Err(Error::Storage(anyhow::anyhow!(
                    "document {} of the {} corpus changed since it was indexed; rebuild the index",
                    doc.id,
                    self.spec.kind
                )));
            }
            aligned.push(entry.clone());
        }
        if !by_id.is_empty() {
            return Err(self.stale(entries.len(), corpus.len()));
        }

        self.hydrate(corpus, &aligned);
        Ok(())
    }

    fn stale(&self, indexed: usize, rows: usize) -> Error {
        Error::Storage(anyhow::anyhow!(
            "index for the {} corpus is out of date ({indexed} documents indexed, {rows} in corpus); rebuild it",
            self.spec.kind
        ))
    }

    fn hydrate(&mut self, corpus: Vec<Document>, entries: &[IndexEntry]) {
        let terms: Vec<Vec<String>> = entries.iter().map(|e| e.terms.clone()).collect();
        let scorer = Bm25::new(&terms, self.params);
        info!(
            "Index ready for {} corpus: {} documents, {} terms",
            self.spec.kind,
            corpus.len(),
            scorer.vocabulary_size()
        );
        self.state = IndexState::Ready(ReadyIndex { corpus, scorer });
    }

    /// The `top_n` best matches for `query`, best first, without zero-score rows.
    pub fn search(&self, query: &str, top_n: usize) -> Result<Vec<Passage>> {
        if top_n == 0 {
            return Err(Error::InvalidTopN(top_n));
        }
        let IndexState::Ready(ready) = &self.state else {
            return Err(Error::IndexUnavailable {
                corpus: self.spec.kind,
            });
        };

        let terms = self.normalizer.terms(query);
        let scores = ready.scorer.scores(&terms);

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(top_n);

        let passages: Vec<Passage> = order
            .into_iter()
            .filter(|&i| scores[i] > 0.0)
            .map(|i| self.passage(&ready.corpus[i], query, scores[i]))
            .collect();

        debug!(
            "Search in {} corpus for {:?}: {} hits",
            self.spec.kind,
            query,
            passages.len()
        );
        Ok(passages)
    }

    fn passage(&self, doc: &Document, query: &str, score: f64) -> Passage {
        let question = self
            .spec
            .question_field
            .as_ref()
            .map_or_else(|| query.to_string(), |field| doc.text(field));

        let mut metadata = self.spec.metadata_of(doc);
        metadata.insert("bm25_score".into(), Value::from(score));
        metadata.insert("question".into(), Value::from(question.clone()));

        Passage {
            document_id: doc.id.clone(),
            bm25_score: score,
            query: query.to_string(),
            question,
            context: self.spec.context_of(doc),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::MemoryStore;

    fn docs_store() -> MemoryStore {
        MemoryStore::with_corpus(
            CorpusKind::Documentation,
            "doc_id",
            vec![
                json!({"doc_id": 1, "doc_type": "general", "name": "rules", "url": "https://docs/rules",
                       "body": "Replication rules describe how many copies of a dataset are kept."}),
                json!({"doc_id": 2, "doc_type": "general", "name": "quota", "url": "https://docs/quota",
                       "body": "Account quotas limit storage usage per site."}),
                json!({"doc_id": 3, "doc_type": "general", "name": "auth", "url": "https://docs/auth",
                       "body": "Authentication uses certificates or tokens."}),
            ],
        )
    }

    #[tokio::test]
    async fn search_before_ready_is_unavailable() {
        let index = LexicalIndex::new(IndexSpec::documentation());
        let err = index.search("quota", 3).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexUnavailable {
                corpus: CorpusKind::Documentation
            }
        ));
        assert!(!index.is_ready());
    }

    #[tokio::test]
    async fn zero_top_n_is_rejected() {
        let store = docs_store();
        let mut index = LexicalIndex::new(IndexSpec::documentation());
        index.create_index(&store).await.unwrap();
        assert!(matches!(index.search("quota", 0), Err(Error::InvalidTopN(0))));
    }

    #[tokio::test]
    async fn only_matching_rows_are_returned() {
        let store = docs_store();
        let mut index = LexicalIndex::new(IndexSpec::documentation());
        index.create_index(&store).await.unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.search("How do quotas work?", 3).unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.document_id, "2");
        assert!(hit.bm25_score > 0.0);
        assert_eq!(hit.question, "How do quotas work?");
        assert_eq!(hit.context, "general Account quotas limit storage usage per site.");
        assert_eq!(hit.metadata["url"], json!("https://docs/quota"));
        assert!(hit.metadata.contains_key("bm25_score"));
        assert!(!hit.metadata.contains_key("body"));
    }

    #[tokio::test]
    async fn no_overlap_gives_no_rows() {
        let store = docs_store();
        let mut index = LexicalIndex::new(IndexSpec::documentation());
        index.create_index(&store).await.unwrap();
        assert!(index.search("unrelated gibberish", 3).unwrap().is_empty());
    }

    #[tokio::test]
    async fn loading_persisted_terms_gives_the_same_ranking() {
        let store = docs_store();
        let mut built = LexicalIndex::new(IndexSpec::documentation());
        built.create_index(&store).await.unwrap();

        let mut loaded = LexicalIndex::new(IndexSpec::documentation());
        loaded.load_index(&store).await.unwrap();

        let query = "certificates and tokens for authentication";
        let a = built.search(query, 2).unwrap();
        let b = loaded.search(query, 2).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].document_id, b[0].document_id);
        assert!((a[0].bm25_score - b[0].bm25_score).abs() < 1e-12);
    }

    #[tokio::test]
    async fn stale_index_is_refused() {
        let store = docs_store();
        let mut index = LexicalIndex::new(IndexSpec::documentation());
        index.create_index(&store).await.unwrap();

        store
            .corpora
            .lock()
            .unwrap()
            .get_mut(&CorpusKind::Documentation)
            .unwrap()
            .pop();

        let mut reloaded = LexicalIndex::new(IndexSpec::documentation());
        assert!(matches!(
            reloaded.load_index(&store).await,
            Err(Error::Storage(_))
        ));
        assert!(!reloaded.is_ready());
    }

    #[tokio::test]
    async fn edited_row_makes_the_index_stale() {
        let store = docs_store();
        let mut index = LexicalIndex::new(IndexSpec::documentation());
        index.create_index(&store).await.unwrap();

        store
            .corpora
            .lock()
            .unwrap()
            .get_mut(&CorpusKind::Documentation)
            .unwrap()[1]
            .columns
            .insert("body".into(), json!("Quotas were removed."));

        let mut reloaded = LexicalIndex::new(IndexSpec::documentation());
        let err = reloaded.load_index(&store).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("changed since it was indexed"));
        assert!(!reloaded.is_ready());
    }

    #[tokio::test]
    async fn faq_hits_carry_answer_as_context() {
        let store = MemoryStore::with_corpus(
            CorpusKind::Faq,
            "faq_id",
            vec![
                json!({"faq_id": "faq_1", "question": "How do I renew my certificate?",
                       "answer": "Ask your site admin.", "author": "ops", "keywords": "certificate renew"}),
                json!({"faq_id": "faq_2", "question": "Where is the monitoring dashboard?",
                       "answer": "Under the monitoring tab.", "author": "ops", "keywords": "monitoring"}),
                json!({"faq_id": "faq_3", "question": "Who approves quota requests?",
                       "answer": "The site responsible.", "author": "ops", "keywords": "quota"}),
            ],
        );
        let mut index = LexicalIndex::new(IndexSpec::faq());
        index.create_index(&store).await.unwrap();

        let hits = index.search("renew certificate", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].context, "Ask your site admin.");
        assert_eq!(hits[0].question, "How do I renew my certificate?");
        assert_eq!(hits[0].metadata["question"], json!("How do I renew my certificate?"));
        assert!(!hits[0].metadata.contains_key("answer"));
    }

    #[tokio::test]
    async fn empty_corpus_returns_no_rows() {
        let store = MemoryStore::default();
        let mut index = LexicalIndex::new(IndexSpec::questions());
        index.create_index(&store).await.unwrap();
        assert!(index.is_ready());
        assert!(index.search("anything at all", 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn results_are_best_first() {
        let store = MemoryStore::with_corpus(
            CorpusKind::Questions,
            "question_id",
            vec![
                json!({"question_id": "a", "question": "How to delete a dataset replica?", "context": "ctx a"}),
                json!({"question_id": "b", "question": "Dataset replica deletion stuck for dataset replica rules?", "context": "ctx b"}),
                json!({"question_id": "c", "question": "Why is my token expired?", "context": "ctx c"}),
                json!({"question_id": "d", "question": "Where are the storage quotas?", "context": "ctx d"}),
                json!({"question_id": "e", "question": "Which site hosts the file catalog?", "context": "ctx e"}),
                json!({"question_id": "f", "question": "Can I change my account email?", "context": "ctx f"}),
            ],
        );
        let mut index = LexicalIndex::new(IndexSpec::questions());
        index.create_index(&store).await.unwrap();
        let hits = index.search("delete dataset replica", 6).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.windows(2).all(|w| w[0].bm25_score >= w[1].bm25_score));
        assert!(hits.iter().all(|h| h.bm25_score > 0.0));
        assert_eq!(hits[0].context, "ctx a");
    }
}
