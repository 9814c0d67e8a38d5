//! `SQLite` persistence for corpora, indexes, mined questions and answers.
//!
//! This module provides:
//! - Schema creation for every table
//! - Import of origin corpora (docs, emails, issues, comments)
//! - The [`IndexStore`] and [`AnswerRepo`] implementations
//! - Context resolvers over the origin tables

mod context;
pub mod convert;
pub mod records;

use async_trait::async_trait;
use lexqa_core::{
    Answer, AnswerRepo, ContextResolvers, CorpusKind, Document, Faq, IndexEntry, IndexStore,
    Label, Origin, Question,
};
use lexqa_entities::{
    answers, conversations, docs, emails, faq, index_terms, issue_comments, issues, questions,
};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Schema,
    TransactionTrait,
};
use tracing::{debug, info};

pub use context::{CommentThreadResolver, EmailThreadResolver, IssueThreadResolver};
pub use records::{CommentRecord, DocRecord, EmailRecord, IssueRecord};

use crate::mining::ConversationRegistry;

/// Rows per `INSERT`; keeps statements under the `SQLite` variable limit.
const INSERT_CHUNK: usize = 200;

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

/// Database-backed store shared by the CLI commands.
pub struct Store {
    db: DatabaseConnection,
    /// `doc_type` values left out of the documentation corpus.
    excluded_doc_types: Vec<String>,
}

impl Store {
    /// Connect to `database_url`. In-memory `SQLite` gets a single pooled
    /// connection so every query sees the same database.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database: {}", database_url);
        let mut options = ConnectOptions::new(database_url);
        options.sqlx_logging(false);
        if database_url.contains(":memory:") {
            options.max_connections(1).min_connections(1);
        }
        let db = Database::connect(options).await?;
        Ok(Self::new(db))
    }

    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            excluded_doc_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_excluded_doc_types(mut self, doc_types: Vec<String>) -> Self {
        self.excluded_doc_types = doc_types;
        self
    }

    /// Get a reference to the database connection.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create every missing table.
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let statements = [
            schema.create_table_from_entity(docs::Entity),
            schema.create_table_from_entity(emails::Entity),
            schema.create_table_from_entity(issues::Entity),
            schema.create_table_from_entity(issue_comments::Entity),
            schema.create_table_from_entity(conversations::Entity),
            schema.create_table_from_entity(questions::Entity),
            schema.create_table_from_entity(faq::Entity),
            schema.create_table_from_entity(index_terms::Entity),
            schema.create_table_from_entity(answers::Entity),
        ];
        for stmt in &statements {
            match self
                .db
                .execute_unprepared(&backend.build(stmt).to_string())
                .await
            {
                Ok(_) => {}
                Err(e) if is_table_already_exists_error(&e) => {
                    debug!("Table already exists, skipping creation");
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Dispatch table resolving question context from the origin tables.
    #[must_use]
    pub fn context_resolvers(&self) -> ContextResolvers {
        ContextResolvers::new()
            .with(Origin::Email, EmailThreadResolver::new(self.db.clone()))
            .with(Origin::Issue, IssueThreadResolver::new(self.db.clone()))
            .with(Origin::Comment, CommentThreadResolver::new(self.db.clone()))
    }

    pub async fn import_docs(&self, records: Vec<DocRecord>) -> anyhow::Result<u64> {
        let rows: Vec<docs::ActiveModel> = records
            .into_iter()
            .map(|r| docs::Model::from(r).into_active_model())
            .collect();
        self.insert_chunked(rows, docs::Column::DocId).await
    }

    /// Import emails, threading them through `registry`.
    ///
    /// Replies in the batch open their conversations before any email is
    /// assigned, so first messages join the thread their replies start.
    pub async fn import_emails(
        &self,
        records: Vec<EmailRecord>,
        registry: &mut ConversationRegistry,
    ) -> anyhow::Result<u64> {
        let opened = registry.register_replies(records.iter().map(|r| r.subject.as_str()));
        debug!("{opened} new conversations opened by this batch");
        let rows: Vec<emails::ActiveModel> = records
            .into_iter()
            .map(|r| r.into_model(registry).into_active_model())
            .collect();
        let inserted = self.insert_chunked(rows, emails::Column::EmailId).await?;
        self.save_conversations(registry).await?;
        Ok(inserted)
    }

    pub async fn import_issues(&self, records: Vec<IssueRecord>) -> anyhow::Result<u64> {
        let rows: Vec<issues::ActiveModel> = records
            .into_iter()
            .map(|r| issues::Model::from(r).into_active_model())
            .collect();
        self.insert_chunked(rows, issues::Column::IssueId).await
    }

    pub async fn import_comments(&self, records: Vec<CommentRecord>) -> anyhow::Result<u64> {
        let rows: Vec<issue_comments::ActiveModel> = records
            .into_iter()
            .map(|r| issue_comments::Model::from(r).into_active_model())
            .collect();
        self.insert_chunked(rows, issue_comments::Column::CommentId)
            .await
    }

    /// Insert rows in chunks, skipping rows whose key already exists.
    /// Returns the number of rows actually inserted.
    async fn insert_chunked<A, C>(&self, rows: Vec<A>, key: C) -> anyhow::Result<u64>
    where
        A: ActiveModelTrait + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
        C: ColumnTrait,
    {
        let mut inserted = 0;
        let mut rows = rows.into_iter().peekable();
        while rows.peek().is_some() {
            let chunk: Vec<A> = rows.by_ref().take(INSERT_CHUNK).collect();
            inserted += A::Entity::insert_many(chunk)
                .on_conflict(OnConflict::column(key).do_nothing().to_owned())
                .exec_without_returning(&self.db)
                .await?;
        }
        Ok(inserted)
    }

    pub async fn insert_question(&self, question: &Question) -> anyhow::Result<()> {
        convert::question_to_active(question)?
            .insert(&self.db)
            .await?;
        Ok(())
    }

    pub async fn insert_faq(&self, entry: &Faq) -> anyhow::Result<()> {
        convert::faq_to_active(entry).insert(&self.db).await?;
        info!("Stored FAQ entry {}", entry.faq_id);
        Ok(())
    }

    pub async fn load_conversations(&self) -> anyhow::Result<ConversationRegistry> {
        let rows = conversations::Entity::find().all(&self.db).await?;
        Ok(ConversationRegistry::from_entries(
            rows.into_iter().map(|r| (r.subject, r.conversation_id)),
        ))
    }

    pub async fn save_conversations(&self, registry: &ConversationRegistry) -> anyhow::Result<()> {
        let rows: Vec<conversations::ActiveModel> = registry
            .entries()
            .map(|(subject, id)| {
                conversations::Model {
                    subject: subject.to_string(),
                    conversation_id: id.to_string(),
                }
                .into_active_model()
            })
            .collect();
        self.insert_chunked(rows, conversations::Column::Subject)
            .await?;
        Ok(())
    }

    /// `(origin id, text)` of every origin row eligible for question mining.
    ///
    /// Emails must belong to a conversation and come ordered by conversation
    /// and date. Issues need at least one stored comment in `issue_comments`.
    pub async fn origin_texts(&self, origin: Origin) -> anyhow::Result<Vec<(i64, String)>> {
        let rows = match origin {
            Origin::Email => emails::Entity::find()
                .filter(emails::Column::ConversationId.is_not_null())
                .order_by_asc(emails::Column::ConversationId)
                .order_by_asc(emails::Column::EmailDate)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|e| (e.email_id, e.clean_body))
                .collect(),
            Origin::Issue => issues::Entity::find()
                .filter(
                    issues::Column::IssueId.in_subquery(
                        Query::select()
                            .column(issue_comments::Column::IssueId)
                            .from(issue_comments::Entity)
                            .to_owned(),
                    ),
                )
                .order_by_asc(issues::Column::IssueId)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|i| (i.issue_id, i.clean_body))
                .collect(),
            Origin::Comment => issue_comments::Entity::find()
                .order_by_asc(issue_comments::Column::IssueId)
                .order_by_asc(issue_comments::Column::CreatedAt)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.comment_id, c.clean_body))
                .collect(),
        };
        Ok(rows)
    }

    /// Row count of every table, in schema order.
    pub async fn table_counts(&self) -> anyhow::Result<Vec<(&'static str, u64)>> {
        Ok(vec![
            ("docs", docs::Entity::find().count(&self.db).await?),
            ("emails", emails::Entity::find().count(&self.db).await?),
            ("issues", issues::Entity::find().count(&self.db).await?),
            (
                "issue_comments",
                issue_comments::Entity::find().count(&self.db).await?,
            ),
            (
                "conversations",
                conversations::Entity::find().count(&self.db).await?,
            ),
            ("questions", questions::Entity::find().count(&self.db).await?),
            ("faq", faq::Entity::find().count(&self.db).await?),
            (
                "index_terms",
                index_terms::Entity::find().count(&self.db).await?,
            ),
            ("answers", answers::Entity::find().count(&self.db).await?),
        ])
    }

    async fn documentation_corpus(&self) -> anyhow::Result<Vec<Document>> {
        let mut query = docs::Entity::find().order_by_asc(docs::Column::DocId);
        if !self.excluded_doc_types.is_empty() {
            query = query.filter(docs::Column::DocType.is_not_in(self.excluded_doc_types.clone()));
        }
        to_documents(&query.all(&self.db).await?, "doc_id")
    }

    async fn questions_corpus(&self) -> anyhow::Result<Vec<Document>> {
        let rows = questions::Entity::find()
            .filter(questions::Column::Context.is_not_null())
            .filter(questions::Column::Context.ne(""))
            .order_by_asc(questions::Column::QuestionId)
            .all(&self.db)
            .await?;
        to_documents(&rows, "question_id")
    }

    async fn faq_corpus(&self) -> anyhow::Result<Vec<Document>> {
        let rows = faq::Entity::find()
            .order_by_asc(faq::Column::CreatedAt)
            .all(&self.db)
            .await?;
        to_documents(&rows, "faq_id")
    }
}

fn to_documents<M: serde::Serialize>(rows: &[M], id_field: &str) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(doc) = convert::row_to_document(row, id_field)? {
            documents.push(doc);
        }
    }
    Ok(documents)
}

#[async_trait]
impl IndexStore for Store {
    async fn load_corpus(&self, kind: CorpusKind) -> anyhow::Result<Vec<Document>> {
        match kind {
            CorpusKind::Documentation => self.documentation_corpus().await,
            CorpusKind::Questions => self.questions_corpus().await,
            CorpusKind::Faq => self.faq_corpus().await,
        }
    }

    async fn save_index(&self, kind: CorpusKind, entries: &[IndexEntry]) -> anyhow::Result<()> {
        let txn = self.db.begin().await?;
        index_terms::Entity::delete_many()
            .filter(index_terms::Column::Corpus.eq(kind.as_str()))
            .exec(&txn)
            .await?;
        for chunk in entries.chunks(INSERT_CHUNK) {
            let rows = chunk.iter().map(|e| convert::entry_to_active(kind, e));
            index_terms::Entity::insert_many(rows).exec(&txn).await?;
        }
        txn.commit().await?;
        info!("Saved {} index rows for {} corpus", entries.len(), kind);
        Ok(())
    }

    async fn load_index(&self, kind: CorpusKind) -> anyhow::Result<Vec<IndexEntry>> {
        let rows = index_terms::Entity::find()
            .filter(index_terms::Column::Corpus.eq(kind.as_str()))
            .all(&self.db)
            .await?;
        Ok(rows.iter().map(convert::entry_from_model).collect())
    }
}

#[async_trait]
impl AnswerRepo for Store {
    async fn insert_answer(&self, answer: &Answer) -> anyhow::Result<()> {
        convert::answer_to_active(answer)?.insert(&self.db).await?;
        Ok(())
    }

    async fn find_answer(&self, answer_id: &str) -> anyhow::Result<Option<Answer>> {
        answers::Entity::find_by_id(answer_id.to_owned())
            .one(&self.db)
            .await?
            .map(convert::answer_from_model)
            .transpose()
    }

    async fn update_label(&self, answer_id: &str, label: Option<Label>) -> anyhow::Result<bool> {
        let result = answers::Entity::update_many()
            .col_expr(answers::Column::Label, Expr::value(label.map(Label::as_i32)))
            .filter(answers::Column::AnswerId.eq(answer_id))
            .exec(&self.db)
            .await?;
        info!("Label of answer {} set to {:?}", answer_id, label);
        Ok(result.rows_affected > 0)
    }
}
