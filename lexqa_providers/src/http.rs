use async_trait::async_trait;
use lexqa_core::{ExtractionParams, SpanCandidate, SpanExtractor};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::retry::{RetryPolicy, retry_with_backoff};

/// Span extraction served by a remote question-answering model.
///
/// `POST <base_url>/predict` answers with one candidate object or an array
/// of them; `GET <base_url>/models/<model>` reports whether the model is
/// available.
pub struct HttpSpanExtractor {
    client: Client,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Many(Vec<SpanCandidate>),
    One(SpanCandidate),
}

impl HttpSpanExtractor {
    pub fn new(base_url: &str, model: String) -> Self {
        info!("Creating HttpSpanExtractor for model {}", model);
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check once that the model is served. A missing model is a
    /// configuration error.
    pub async fn verify(&self) -> lexqa_core::Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self.client.get(&url).send().await.map_err(|e| {
            lexqa_core::Error::Config(format!("extraction service unreachable at {url}: {e}"))
        })?;

        match response.status() {
            status if status.is_success() => {
                info!("Extraction model {} is available", self.model);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(lexqa_core::Error::Config(format!(
                "extraction model {} is not available at {}",
                self.model, self.base_url
            ))),
            status => Err(lexqa_core::Error::Config(format!(
                "extraction service answered {status} for {url}"
            ))),
        }
    }

    fn request_body(&self, question: &str, context: &str, params: &ExtractionParams) -> Value {
        json!({
            "model": self.model,
            "question": question,
            "context": context,
            "top_k": params.top_k,
            "max_answer_len": params.max_answer_len,
            "max_question_len": params.max_question_len,
            "max_seq_len": params.max_seq_len,
            "doc_stride": params.doc_stride,
            "handle_impossible_answer": params.handle_impossible_answer,
        })
    }

    /// Helper method to send a single request
    async fn try_send(&self, request: &Value) -> anyhow::Result<Vec<SpanCandidate>> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        parse_candidates(response)
    }
}

/// Candidates from a `/predict` response body.
pub fn parse_candidates(body: Value) -> anyhow::Result<Vec<SpanCandidate>> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    let candidates = match serde_json::from_value::<PredictResponse>(body)
        .map_err(|e| anyhow::anyhow!("Invalid response format: {e}"))?
    {
        PredictResponse::Many(all) => all,
        PredictResponse::One(one) => vec![one],
    };
    for c in &candidates {
        if c.start > c.end {
            anyhow::bail!("Invalid span offsets {}..{}", c.start, c.end);
        }
    }
    Ok(candidates)
}

#[async_trait]
impl SpanExtractor for HttpSpanExtractor {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn predict(
        &self,
        question: &str,
        context: &str,
        params: &ExtractionParams,
    ) -> anyhow::Result<Vec<SpanCandidate>> {
        if context.trim().is_empty() {
            return Ok(Vec::new());
        }
        let request = self.request_body(question, context, params);
        debug!("Sending predict request: {} context bytes", context.len());

        let candidates = retry_with_backoff(|| self.try_send(&request), &self.retry).await?;
        debug!("Received {} candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_and_array_bodies_are_accepted() {
        let one = parse_candidates(json!({"answer": "Restart it", "score": 0.8, "start": 0, "end": 10}))
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].text, "Restart it");

        let many = parse_candidates(json!([
            {"answer": "a", "score": 0.5, "start": 0, "end": 1},
            {"answer": "b", "score": 0.25, "start": 2, "end": 3}
        ]))
        .unwrap();
        assert_eq!(many.len(), 2);
        assert!((many[1].score - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert!(parse_candidates(json!({"text": "x"})).is_err());
        assert!(parse_candidates(json!({"answer": "x", "score": 0.1, "start": 5, "end": 2})).is_err());
        assert!(parse_candidates(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn request_carries_extraction_bounds() {
        let extractor = HttpSpanExtractor::new("http://localhost:8000/", "squad".to_string());
        assert_eq!(extractor.base_url(), "http://localhost:8000");
        let body = extractor.request_body("Why?", "Because.", &ExtractionParams::default());
        assert_eq!(body["question"], "Why?");
        assert_eq!(body["top_k"], 3);
        assert_eq!(body["doc_stride"], 128);
        assert_eq!(body["handle_impossible_answer"], true);
        assert_eq!(body["model"], "squad");
    }

    #[tokio::test]
    async fn blank_context_skips_the_request() {
        let extractor = HttpSpanExtractor::new("http://127.0.0.1:9", "squad".to_string())
            .with_retry(RetryPolicy::none());
        let out = extractor
            .predict("Why?", "   ", &ExtractionParams::default())
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_fails_verification() {
        let extractor = HttpSpanExtractor::new("http://127.0.0.1:9", "squad".to_string());
        let err = extractor.verify().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
