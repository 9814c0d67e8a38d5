//! Row formats accepted by `import`.

use chrono::{DateTime, Utc};
use lexqa_entities::{docs, emails, issue_comments, issues};
use serde::Deserialize;

use crate::mining::{ConversationRegistry, clean_email_body};

#[derive(Debug, Clone, Deserialize)]
pub struct DocRecord {
    pub doc_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub body: String,
    pub doc_type: String,
}

impl From<DocRecord> for docs::Model {
    fn from(r: DocRecord) -> Self {
        Self {
            doc_id: r.doc_id,
            name: r.name,
            url: r.url,
            body: r.body,
            doc_type: r.doc_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRecord {
    pub email_id: i64,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    pub subject: String,
    pub body: String,
    /// Derived from `body` when absent.
    #[serde(default)]
    pub clean_body: Option<String>,
    pub email_date: DateTime<Utc>,
}

impl EmailRecord {
    /// Row for the emails table, threaded through `registry`.
    pub fn into_model(self, registry: &mut ConversationRegistry) -> emails::Model {
        let clean_body = self
            .clean_body
            .unwrap_or_else(|| clean_email_body(&self.body));
        emails::Model {
            conversation_id: registry.assign(&self.subject),
            email_id: self.email_id,
            sender: self.sender,
            receiver: self.receiver,
            subject: self.subject,
            body: self.body,
            clean_body,
            email_date: self.email_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    pub issue_id: i64,
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Number of comments on the issue.
    #[serde(default)]
    pub comments: i32,
    pub body: String,
    #[serde(default)]
    pub clean_body: Option<String>,
}

impl From<IssueRecord> for issues::Model {
    fn from(r: IssueRecord) -> Self {
        let clean_body = r.clean_body.unwrap_or_else(|| collapse_whitespace(&r.body));
        Self {
            issue_id: r.issue_id,
            title: r.title,
            state: r.state,
            creator: r.creator,
            created_at: r.created_at,
            comments: r.comments,
            body: r.body,
            clean_body,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    pub comment_id: i64,
    pub issue_id: i64,
    #[serde(default)]
    pub creator: Option<String>,
    pub created_at: DateTime<Utc>,
    pub body: String,
    #[serde(default)]
    pub clean_body: Option<String>,
}

impl From<CommentRecord> for issue_comments::Model {
    fn from(r: CommentRecord) -> Self {
        let clean_body = r.clean_body.unwrap_or_else(|| collapse_whitespace(&r.body));
        Self {
            comment_id: r.comment_id,
            issue_id: r.issue_id,
            creator: r.creator,
            created_at: r.created_at,
            body: r.body,
            clean_body,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
