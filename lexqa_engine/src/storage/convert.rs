//! Conversions between domain types and database rows.

use lexqa_core::{Answer, CorpusKind, Document, Faq, IndexEntry, Label, Question};
use lexqa_entities::{answers, faq, index_terms, questions};
use sea_orm::Set;
use serde::Serialize;
use serde_json::Value;

pub fn answer_to_active(answer: &Answer) -> anyhow::Result<answers::ActiveModel> {
    Ok(answers::ActiveModel {
        answer_id: Set(answer.id.clone()),
        user_question_id: Set(answer.user_question_id.clone()),
        user_question: Set(answer.user_question.clone()),
        answer: Set(answer.answer_span.clone()),
        start: Set(i64::try_from(answer.span_start)?),
        end: Set(i64::try_from(answer.span_end)?),
        confidence: Set(answer.confidence),
        extended_answer: Set(answer.extended_answer.clone()),
        extended_start: Set(i64::try_from(answer.extended_start)?),
        extended_end: Set(i64::try_from(answer.extended_end)?),
        model: Set(answer.source_model.clone()),
        origin: Set(answer.origin.to_string()),
        created_at: Set(answer.created_at),
        label: Set(answer.label.map(Label::as_i32)),
        metadata: Set(Value::Object(answer.metadata.clone())),
    })
}

pub fn answer_from_model(model: answers::Model) -> anyhow::Result<Answer> {
    let metadata = match model.metadata {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => anyhow::bail!("answer {} has non-object metadata: {other}", model.answer_id),
    };
    Ok(Answer {
        id: model.answer_id,
        user_question: model.user_question,
        user_question_id: model.user_question_id,
        answer_span: model.answer,
        span_start: usize::try_from(model.start)?,
        span_end: usize::try_from(model.end)?,
        confidence: model.confidence,
        extended_answer: model.extended_answer,
        extended_start: usize::try_from(model.extended_start)?,
        extended_end: usize::try_from(model.extended_end)?,
        source_model: model.model,
        origin: model.origin.parse()?,
        created_at: model.created_at,
        label: model.label.and_then(Label::from_i32),
        metadata,
    })
}

pub fn question_to_active(question: &Question) -> anyhow::Result<questions::ActiveModel> {
    let (email_id, issue_id, comment_id) = question.foreign_keys();
    Ok(questions::ActiveModel {
        question_id: Set(question.id.clone()),
        question: Set(question.text.clone()),
        start: Set(i64::try_from(question.start)?),
        end: Set(i64::try_from(question.end)?),
        context: Set(question.context().map(ToString::to_string)),
        email_id: Set(email_id),
        issue_id: Set(issue_id),
        comment_id: Set(comment_id),
    })
}

pub fn faq_to_active(entry: &Faq) -> faq::ActiveModel {
    faq::ActiveModel {
        faq_id: Set(entry.faq_id.clone()),
        question: Set(entry.question.clone()),
        answer: Set(entry.answer.clone()),
        author: Set(entry.author.clone()),
        keywords: Set(entry.keywords.clone()),
        created_at: Set(entry.created_at),
    }
}

pub fn entry_to_active(kind: CorpusKind, entry: &IndexEntry) -> index_terms::ActiveModel {
    index_terms::ActiveModel {
        corpus: Set(kind.as_str().to_string()),
        document_id: Set(entry.document_id.clone()),
        fingerprint: Set(entry.fingerprint.clone()),
        terms: Set(entry.joined_terms()),
    }
}

pub fn entry_from_model(model: &index_terms::Model) -> IndexEntry {
    IndexEntry::from_joined(
        model.document_id.clone(),
        model.fingerprint.clone(),
        &model.terms,
    )
}

/// Serialize a row into a document, keyed by `id_field`.
pub fn row_to_document<M: Serialize>(row: &M, id_field: &str) -> anyhow::Result<Option<Document>> {
    match serde_json::to_value(row)? {
        Value::Object(columns) => Ok(Document::from_row(columns, id_field)),
        other => anyhow::bail!("row did not serialize to an object: {other}"),
    }
}
