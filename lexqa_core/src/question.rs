//! Mined questions and origin-specific context resolution.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Where a mined question came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Email,
    Issue,
    Comment,
}

impl Origin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Issue => "issue",
            Self::Comment => "comment",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "email" | "emails" => Ok(Self::Email),
            "issue" | "issues" => Ok(Self::Issue),
            "comment" | "comments" => Ok(Self::Comment),
            _ => Err(anyhow::anyhow!("unknown question origin: {s}")),
        }
    }
}

/// An interrogative span found in source text.
///
/// `start`/`end` are byte offsets into the exact string passed to the
/// miner; they go stale as soon as that string is transformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub origin: Origin,
    origin_id: Option<i64>,
    context: Option<String>,
}

impl Question {
    #[must_use]
    pub fn new(text: String, start: usize, end: usize, origin: Origin) -> Self {
        debug_assert!(start < end, "question span must not be empty");
        Self {
            id: Uuid::now_v7().simple().to_string(),
            text,
            start,
            end,
            origin,
            origin_id: None,
            context: None,
        }
    }

    /// Rebuild a question that was already persisted.
    #[must_use]
    pub fn restore(
        id: String,
        text: String,
        span: (usize, usize),
        origin: Origin,
        origin_id: i64,
        context: Option<String>,
    ) -> Self {
        Self {
            id,
            text,
            start: span.0,
            end: span.1,
            origin,
            origin_id: Some(origin_id),
            context,
        }
    }

    pub const fn set_origin_id(&mut self, origin_id: i64) {
        self.origin_id = Some(origin_id);
    }

    #[must_use]
    pub const fn origin_id(&self) -> Option<i64> {
        self.origin_id
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Whether the question has non-empty context and may join the retrieval corpus.
    #[must_use]
    pub fn has_context(&self) -> bool {
        self.context.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Foreign keys as stored in the questions table: `(email_id, issue_id, comment_id)`.
    /// Exactly one is set once the origin id is known.
    #[must_use]
    pub const fn foreign_keys(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match self.origin {
            Origin::Email => (self.origin_id, None, None),
            Origin::Issue => (None, self.origin_id, None),
            Origin::Comment => (None, None, self.origin_id),
        }
    }

    /// Look up the question's context through the resolver registered for its origin.
    ///
    /// # Errors
    /// Fails with [`Error::OriginNotSet`] if `set_origin_id` has not been called.
    pub async fn resolve_context(&mut self, resolvers: &ContextResolvers) -> Result<()> {
        let origin_id = self.origin_id.ok_or_else(|| Error::OriginNotSet {
            question_id: self.id.clone(),
        })?;
        self.context = resolvers.resolve(self.origin, origin_id).await?;
        Ok(())
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id = {}, text = {:?}, span = {}..{}, origin = {}",
            self.id, self.text, self.start, self.end, self.origin
        )
    }
}

/// Resolves the conversational context that follows a question in its origin corpus.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// `Ok(None)` when the origin row has no thread to draw context from.
    async fn resolve(&self, origin_id: i64) -> anyhow::Result<Option<String>>;
}

/// Dispatch table of context resolvers keyed by origin.
#[derive(Clone, Default)]
pub struct ContextResolvers {
    resolvers: HashMap<Origin, Arc<dyn ContextResolver>>,
}

impl ContextResolvers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<R>(mut self, origin: Origin, resolver: R) -> Self
    where
        R: ContextResolver + 'static,
    {
        self.resolvers.insert(origin, Arc::new(resolver));
        self
    }

    pub async fn resolve(&self, origin: Origin, origin_id: i64) -> Result<Option<String>> {
        let resolver = self
            .resolvers
            .get(&origin)
            .ok_or(Error::MissingResolver(origin))?;
        resolver.resolve(origin_id).await.map_err(Error::Storage)
    }
}
