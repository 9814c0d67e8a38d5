//! Context resolution against the origin tables.

use async_trait::async_trait;
use lexqa_core::ContextResolver;
use lexqa_entities::{emails, issue_comments, issues};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Later messages of the email's conversation, in date order.
pub struct EmailThreadResolver {
    db: DatabaseConnection,
}

impl EmailThreadResolver {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextResolver for EmailThreadResolver {
    async fn resolve(&self, origin_id: i64) -> anyhow::Result<Option<String>> {
        let email = emails::Entity::find_by_id(origin_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("email {origin_id} not found"))?;
        let Some(conversation_id) = email.conversation_id else {
            return Ok(None);
        };

        let later = emails::Entity::find()
            .filter(emails::Column::ConversationId.eq(conversation_id))
            .filter(emails::Column::EmailDate.gt(email.email_date))
            .order_by_asc(emails::Column::EmailDate)
            .all(&self.db)
            .await?;
        Ok(Some(join_bodies(later.into_iter().map(|e| e.clean_body))))
    }
}

/// Every comment under the issue, in creation order.
pub struct IssueThreadResolver {
    db: DatabaseConnection,
}

impl IssueThreadResolver {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextResolver for IssueThreadResolver {
    async fn resolve(&self, origin_id: i64) -> anyhow::Result<Option<String>> {
        let issue = issues::Entity::find_by_id(origin_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("issue {origin_id} not found"))?;

        let comments = issue_comments::Entity::find()
            .filter(issue_comments::Column::IssueId.eq(issue.issue_id))
            .order_by_asc(issue_comments::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(Some(join_bodies(comments.into_iter().map(|c| c.clean_body))))
    }
}

/// Comments of the same issue created after the question's comment.
pub struct CommentThreadResolver {
    db: DatabaseConnection,
}

impl CommentThreadResolver {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContextResolver for CommentThreadResolver {
    async fn resolve(&self, origin_id: i64) -> anyhow::Result<Option<String>> {
        let comment = issue_comments::Entity::find_by_id(origin_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("comment {origin_id} not found"))?;

        let later = issue_comments::Entity::find()
            .filter(issue_comments::Column::IssueId.eq(comment.issue_id))
            .filter(issue_comments::Column::CreatedAt.gt(comment.created_at))
            .order_by_asc(issue_comments::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(Some(join_bodies(later.into_iter().map(|c| c.clean_body))))
    }
}

fn join_bodies<I: Iterator<Item = String>>(bodies: I) -> String {
    bodies
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
