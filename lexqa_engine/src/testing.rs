//! Test doubles shared by the engine's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lexqa_core::{
    CorpusKind, Document, ExtractionParams, IndexEntry, IndexStore, Passage, SpanCandidate,
    SpanExtractor,
};
use serde_json::Value;

/// In-memory corpora and index tables.
#[derive(Default)]
pub struct MemoryStore {
    pub corpora: Mutex<HashMap<CorpusKind, Vec<Document>>>,
    pub indexes: Mutex<HashMap<CorpusKind, Vec<IndexEntry>>>,
}

impl MemoryStore {
    pub fn with_corpus(kind: CorpusKind, id_field: &str, rows: Vec<Value>) -> Self {
        let store = Self::default();
        store.add_corpus(kind, id_field, rows);
        store
    }

    pub fn add_corpus(&self, kind: CorpusKind, id_field: &str, rows: Vec<Value>) {
        let docs = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Document::from_row(map, id_field),
                _ => None,
            })
            .collect();
        self.corpora.lock().unwrap().insert(kind, docs);
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn load_corpus(&self, kind: CorpusKind) -> anyhow::Result<Vec<Document>> {
        Ok(self
            .corpora
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_index(&self, kind: CorpusKind, entries: &[IndexEntry]) -> anyhow::Result<()> {
        self.indexes.lock().unwrap().insert(kind, entries.to_vec());
        Ok(())
    }

    async fn load_index(&self, kind: CorpusKind) -> anyhow::Result<Vec<IndexEntry>> {
        Ok(self
            .indexes
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}

/// Span extractor answering from a fixed script keyed by passage text.
#[derive(Default)]
pub struct ScriptedExtractor {
    answers: HashMap<String, Vec<SpanCandidate>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` (located inside `context`) with `score`.
    pub fn answer(self, context: &str, text: &str, score: f64) -> Self {
        let start = context.find(text).unwrap();
        self.raw(context, text, score, start, start + text.len())
    }

    pub fn raw(mut self, context: &str, text: &str, score: f64, start: usize, end: usize) -> Self {
        self.answers
            .entry(context.to_string())
            .or_default()
            .push(SpanCandidate {
                text: text.to_string(),
                score,
                start,
                end,
            });
        self
    }

    pub fn fail_on(mut self, context: &str) -> Self {
        self.failing.insert(context.to_string());
        self
    }

    pub fn delay_on(mut self, context: &str, delay: Duration) -> Self {
        self.delays.insert(context.to_string(), delay);
        self
    }
}

#[async_trait]
impl SpanExtractor for ScriptedExtractor {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn predict(
        &self,
        _question: &str,
        context: &str,
        params: &ExtractionParams,
    ) -> anyhow::Result<Vec<SpanCandidate>> {
        if let Some(delay) = self.delays.get(context) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(context) {
            anyhow::bail!("model rejected the passage");
        }
        let mut found = self.answers.get(context).cloned().unwrap_or_default();
        found.truncate(params.top_k);
        Ok(found)
    }
}

pub fn passage(id: &str, context: &str, metadata: Value) -> Passage {
    let Value::Object(metadata) = metadata else {
        panic!("passage metadata must be an object");
    };
    Passage {
        document_id: id.to_string(),
        bm25_score: 1.0,
        query: String::new(),
        question: String::new(),
        context: context.to_string(),
        metadata,
    }
}
