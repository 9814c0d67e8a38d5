//! Turns retrieved passages into ranked answers through a span extractor.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use lexqa_core::{Answer, AnswerOrigin, AnswerSpan, ExtractionParams, Passage, SpanCandidate, SpanExtractor};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Knobs of the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    pub params: ExtractionParams,
    /// Characters of passage added on each side of a span for the extended answer.
    pub extended_answer_size: usize,
    /// Upper bound for one passage call.
    pub timeout: Duration,
    /// Passages extracted at once.
    pub concurrency: usize,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            params: ExtractionParams::default(),
            extended_answer_size: 30,
            timeout: Duration::from_secs(30),
            concurrency: 4,
        }
    }
}

/// Runs a [`SpanExtractor`] over passages and ranks what it finds.
pub struct AnswerExtractor<E> {
    extractor: E,
    settings: ExtractorSettings,
}

impl<E: SpanExtractor> AnswerExtractor<E> {
    pub const fn new(extractor: E, settings: ExtractorSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    pub fn model_name(&self) -> &str {
        self.extractor.model_name()
    }

    pub const fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Answers for `question` from every passage, by confidence, at most `top_k`.
    ///
    /// A passage whose extraction fails or times out is logged and skipped.
    /// Equal confidences keep passage order.
    pub async fn extract(
        &self,
        question: &str,
        passages: &[Passage],
        top_k: Option<usize>,
    ) -> Vec<Answer> {
        let per_passage: Vec<Vec<Answer>> = stream::iter(passages.iter().enumerate())
            .map(|(i, passage)| self.extract_passage(i, question, passage))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut answers: Vec<Answer> = per_passage.into_iter().flatten().collect();
        sort_by_confidence(&mut answers);
        if let Some(k) = top_k {
            answers.truncate(k);
        }
        debug!(
            "Extracted {} answers from {} passages",
            answers.len(),
            passages.len()
        );
        answers
    }

    async fn extract_passage(&self, index: usize, question: &str, passage: &Passage) -> Vec<Answer> {
        if passage.context.trim().is_empty() {
            return Vec::new();
        }

        let call = self
            .extractor
            .predict(question, &passage.context, &self.settings.params);
        let candidates = match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!("Extraction failed for passage {index} ({}): {e:#}", passage.document_id);
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    "Extraction timed out after {:?} for passage {index} ({})",
                    self.settings.timeout, passage.document_id
                );
                return Vec::new();
            }
        };

        let origin = infer_origin(&passage.metadata);
        candidates
            .into_iter()
            .filter(|c| !c.text.is_empty())
            .filter_map(|c| {
                let span = self.widen(&passage.context, &c);
                if span.is_none() {
                    warn!(
                        "Dropping candidate {:?} with offsets {}..{} not found in passage {index}",
                        c.text, c.start, c.end
                    );
                }
                span.map(|span| {
                    Answer::new(
                        question,
                        span,
                        Some(c.score),
                        self.extractor.model_name(),
                        origin,
                        passage.metadata.clone(),
                    )
                })
            })
            .collect()
    }

    /// Candidate span plus `extended_answer_size` characters on both sides,
    /// clipped to the passage. Offsets are byte offsets into `context`.
    ///
    /// A candidate whose offsets do not slice out its own text is moved to the
    /// first occurrence of that text, or dropped when the passage lacks it.
    fn widen(&self, context: &str, candidate: &SpanCandidate) -> Option<AnswerSpan> {
        let located = context.get(candidate.start..candidate.end);
        let (start, end) = if located == Some(candidate.text.as_str()) {
            (candidate.start, candidate.end)
        } else {
            let start = context.find(&candidate.text)?;
            debug!(
                "Relocated candidate {:?} from {}..{} to byte {start}",
                candidate.text, candidate.start, candidate.end
            );
            (start, start + candidate.text.len())
        };

        let margin = self.settings.extended_answer_size;
        let extended_start = context[..start]
            .char_indices()
            .rev()
            .take(margin)
            .last()
            .map_or(start, |(i, _)| i);
        let extended_end = context[end..]
            .char_indices()
            .nth(margin)
            .map_or(context.len(), |(i, _)| end + i);

        Some(AnswerSpan {
            text: candidate.text.clone(),
            start,
            end,
            extended_text: context[extended_start..extended_end].to_string(),
            extended_start,
            extended_end,
        })
    }
}

/// Stable sort by confidence, highest first. Answers without confidence go last.
pub fn sort_by_confidence(answers: &mut [Answer]) {
    answers.sort_by(|a, b| {
        let a = a.confidence.unwrap_or(f64::NEG_INFINITY);
        let b = b.confidence.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
}

/// Corpus an answer came from, judged by the id column of its passage.
fn infer_origin(metadata: &Map<String, Value>) -> AnswerOrigin {
    if metadata.contains_key("doc_id") {
        AnswerOrigin::Documentation
    } else if metadata.contains_key("faq_id") {
        AnswerOrigin::Faq
    } else {
        AnswerOrigin::Questions
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedExtractor, passage};

    fn extractor(script: ScriptedExtractor) -> AnswerExtractor<ScriptedExtractor> {
        AnswerExtractor::new(script, ExtractorSettings::default())
    }

    #[tokio::test]
    async fn answers_are_ranked_across_passages() {
        let passages = vec![
            passage("d1", "Quotas are set per account and per site.", json!({"doc_id": 1})),
            passage("d2", "Rules keep two copies of every dataset.", json!({"doc_id": 2})),
        ];
        let script = ScriptedExtractor::new()
            .answer("Quotas are set per account and per site.", "per account", 0.4)
            .answer("Rules keep two copies of every dataset.", "two copies", 0.9)
            .answer("Rules keep two copies of every dataset.", "every dataset", 0.2);

        let answers = extractor(script).extract("how many copies?", &passages, None).await;
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].answer_span, "two copies");
        assert_eq!(answers[1].answer_span, "per account");
        assert_eq!(answers[2].answer_span, "every dataset");
        assert!(answers.iter().all(|a| a.origin == AnswerOrigin::Documentation));
        assert_eq!(answers[0].source_model, "scripted");
        assert_eq!(answers[0].metadata["doc_id"], json!(2));
    }

    #[tokio::test]
    async fn top_k_truncates() {
        let context = "alpha beta gamma delta";
        let passages = vec![passage("q1", context, json!({"question_id": "q1"}))];
        let script = ScriptedExtractor::new()
            .answer(context, "alpha", 0.1)
            .answer(context, "beta", 0.3)
            .answer(context, "gamma", 0.2);

        let answers = extractor(script).extract("which?", &passages, Some(2)).await;
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].answer_span, "beta");
        assert_eq!(answers[1].answer_span, "gamma");
        assert_eq!(answers[0].origin, AnswerOrigin::Questions);
    }

    #[tokio::test]
    async fn failing_passage_is_skipped() {
        let passages = vec![
            passage("d1", "this passage breaks the model", json!({"doc_id": 1})),
            passage("d2", "the answer is forty two", json!({"doc_id": 2})),
        ];
        let script = ScriptedExtractor::new()
            .fail_on("this passage breaks the model")
            .answer("the answer is forty two", "forty two", 0.7);

        let answers = extractor(script).extract("what?", &passages, None).await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_span, "forty two");
    }

    #[tokio::test]
    async fn slow_passage_times_out_without_blocking_the_batch() {
        let passages = vec![
            passage("d1", "slow passage", json!({"doc_id": 1})),
            passage("d2", "fast passage", json!({"doc_id": 2})),
        ];
        let script = ScriptedExtractor::new()
            .delay_on("slow passage", Duration::from_secs(5))
            .answer("slow passage", "slow", 0.9)
            .answer("fast passage", "fast", 0.5);
        let settings = ExtractorSettings {
            timeout: Duration::from_millis(50),
            ..ExtractorSettings::default()
        };

        let answers = AnswerExtractor::new(script, settings)
            .extract("which?", &passages, None)
            .await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_span, "fast");
    }

    #[tokio::test]
    async fn extended_answer_is_clipped_to_the_passage() {
        let context = "Short answer here.";
        let passages = vec![passage("d1", context, json!({"doc_id": 1}))];
        let script = ScriptedExtractor::new().answer(context, "answer", 0.8);

        let answers = extractor(script).extract("what?", &passages, None).await;
        let answer = &answers[0];
        assert_eq!(answer.span_start, 6);
        assert_eq!(answer.span_end, 12);
        assert_eq!(answer.extended_start, 0);
        assert_eq!(answer.extended_end, context.len());
        assert_eq!(answer.extended_answer, context);
        assert_eq!(answer.confidence, Some(0.8));
    }

    #[tokio::test]
    async fn extended_answer_uses_the_margin() {
        let context = format!("{}needle{}", "a".repeat(50), "b".repeat(50));
        let passages = vec![passage("d1", &context, json!({"doc_id": 1}))];
        let script = ScriptedExtractor::new().answer(&context, "needle", 0.8);

        let answers = extractor(script).extract("where?", &passages, None).await;
        let answer = &answers[0];
        assert_eq!(answer.extended_start, 50 - 30);
        assert_eq!(answer.extended_end, 56 + 30);
        assert_eq!(answer.extended_answer.len(), 6 + 60);
    }

    #[tokio::test]
    async fn extended_margin_counts_characters() {
        let context = format!("{}nine{}", "ж".repeat(40), "ж".repeat(40));
        let passages = vec![passage("d1", &context, json!({"doc_id": 1}))];
        let script = ScriptedExtractor::new().answer(&context, "nine", 0.8);

        let answers = extractor(script).extract("which?", &passages, None).await;
        let answer = &answers[0];
        assert_eq!(answer.span_start, 80);
        assert_eq!(answer.span_end, 84);
        assert_eq!(
            answer.extended_answer,
            format!("{}nine{}", "ж".repeat(30), "ж".repeat(30))
        );
        assert_eq!(answer.extended_answer.chars().count(), 64);
        assert_eq!(answer.extended_start, (40 - 30) * 2);
        assert_eq!(answer.extended_end, 84 + 30 * 2);
    }

    #[tokio::test]
    async fn misplaced_offsets_are_relocated_to_the_span_text() {
        let context = format!("{}nine{}", "ж".repeat(40), "ж".repeat(40));
        let passages = vec![passage("d1", &context, json!({"doc_id": 1}))];
        let script = ScriptedExtractor::new().raw(&context, "nine", 0.7, 40, 44);

        let answers = extractor(script).extract("which?", &passages, None).await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_span, "nine");
        assert_eq!(answers[0].span_start, 80);
        assert_eq!(answers[0].span_end, 84);
    }

    #[tokio::test]
    async fn equal_confidence_keeps_passage_order() {
        let passages = vec![
            passage("d1", "first passage text", json!({"doc_id": 1})),
            passage("d2", "second passage text", json!({"doc_id": 2})),
            passage("d3", "third passage text", json!({"doc_id": 3})),
        ];
        let script = ScriptedExtractor::new()
            .answer("first passage text", "first", 0.5)
            .answer("second passage text", "second", 0.5)
            .answer("third passage text", "third", 0.5);

        let answers = extractor(script).extract("which?", &passages, None).await;
        let spans: Vec<&str> = answers.iter().map(|a| a.answer_span.as_str()).collect();
        assert_eq!(spans, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn empty_candidates_and_contexts_produce_nothing() {
        let passages = vec![
            passage("d1", "   ", json!({"doc_id": 1})),
            passage("d2", "some text", json!({"doc_id": 2})),
        ];
        let script = ScriptedExtractor::new().raw("some text", "", 0.9, 0, 0);
        let answers = extractor(script).extract("what?", &passages, None).await;
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_candidates_are_dropped() {
        let passages = vec![passage("d1", "tiny", json!({"doc_id": 1}))];
        let script = ScriptedExtractor::new().raw("tiny", "ghost", 0.9, 2, 40);
        let answers = extractor(script).extract("what?", &passages, None).await;
        assert!(answers.is_empty());
    }

    #[test]
    fn missing_confidence_sorts_last() {
        let mut answers = vec![
            Answer::from_faq("q", "faq", Map::new()),
            Answer::new(
                "q",
                AnswerSpan {
                    text: "x".into(),
                    start: 0,
                    end: 1,
                    extended_text: "x".into(),
                    extended_start: 0,
                    extended_end: 1,
                },
                Some(0.1),
                "m",
                AnswerOrigin::Documentation,
                Map::new(),
            ),
        ];
        sort_by_confidence(&mut answers);
        assert_eq!(answers[0].confidence, Some(0.1));
        assert_eq!(answers[1].confidence, None);
    }
}
