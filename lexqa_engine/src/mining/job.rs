//! Batch question mining over an origin table.

use lexqa_core::{ContextResolvers, Origin, Question};
use serde::Serialize;
use tracing::{debug, info};

use super::detector::QuestionMiner;
use crate::storage::Store;

/// Totals of one mining run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    pub origin: Origin,
    pub rows_scanned: usize,
    pub rows_with_questions: usize,
    pub questions_detected: usize,
    pub questions_stored: usize,
}

/// Mine every eligible row of `origin`, resolve each question's context and
/// store the questions that have one.
pub async fn mine_origin(store: &Store, origin: Origin) -> lexqa_core::Result<MiningReport> {
    let rows = store
        .origin_texts(origin)
        .await
        .map_err(lexqa_core::Error::Storage)?;
    let resolvers = store.context_resolvers();
    let miner = QuestionMiner::new(origin);

    let mut report = MiningReport {
        origin,
        rows_scanned: rows.len(),
        rows_with_questions: 0,
        questions_detected: 0,
        questions_stored: 0,
    };

    for (origin_id, text) in rows {
        let questions = miner.detect(&text);
        if questions.is_empty() {
            continue;
        }
        report.rows_with_questions += 1;
        report.questions_detected += questions.len();

        for question in questions {
            if let Some(stored) = contextualize(question, origin_id, &resolvers).await? {
                store
                    .insert_question(&stored)
                    .await
                    .map_err(lexqa_core::Error::Storage)?;
                report.questions_stored += 1;
            }
        }
    }

    info!(
        "Mined {} rows: {} questions detected in {} rows, {} stored",
        origin, report.questions_detected, report.rows_with_questions, report.questions_stored
    );
    Ok(report)
}

/// Attach origin and context; `None` when there is no context to keep.
async fn contextualize(
    mut question: Question,
    origin_id: i64,
    resolvers: &ContextResolvers,
) -> lexqa_core::Result<Option<Question>> {
    question.set_origin_id(origin_id);
    question.resolve_context(resolvers).await?;
    if question.has_context() {
        Ok(Some(question))
    } else {
        debug!("No context for question {:?} from {} {}", question.text, question.origin, origin_id);
        Ok(None)
    }
}
