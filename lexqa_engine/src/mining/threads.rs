//! Email thread bookkeeping: conversation ids and reply-body cleaning.

use std::collections::HashMap;
use std::sync::OnceLock;

use lexqa_core::short_hash;
use regex::Regex;

const SUBJECT_METACHARACTERS: &str = "^$.|?*+(){}[]";

/// Maps cleaned email subjects to conversation ids.
///
/// Owned by the caller and persisted alongside the email corpus. A
/// conversation is only ever opened by a reply; an email whose subject has
/// no registered conversation stays outside any thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationRegistry {
    by_subject: HashMap<String, String>,
}

impl ConversationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted `(subject, conversation_id)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            by_subject: entries.into_iter().collect(),
        }
    }

    /// Lower-case, drop regex metacharacters, then drop a leading `fwd:` and `re:`.
    #[must_use]
    pub fn clean_subject(subject: &str) -> String {
        let lowered: String = subject
            .to_lowercase()
            .chars()
            .filter(|c| !SUBJECT_METACHARACTERS.contains(*c))
            .collect();
        let mut clean = lowered.trim_start();
        if let Some(rest) = clean.strip_prefix("fwd:") {
            clean = rest.trim_start();
        }
        if let Some(rest) = clean.strip_prefix("re:") {
            clean = rest.trim_start();
        }
        clean.to_string()
    }

    #[must_use]
    pub fn is_reply(subject: &str) -> bool {
        subject.to_lowercase().starts_with("re:")
    }

    #[must_use]
    pub fn conversation_id(clean_subject: &str) -> String {
        format!("cid_{}", short_hash(clean_subject, 6))
    }

    /// Open conversations for every reply among `subjects`.
    ///
    /// Run over a whole batch before [`assign`](Self::assign) so that first
    /// emails of a thread find the conversation their replies open.
    pub fn register_replies<'a, I>(&mut self, subjects: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let before = self.by_subject.len();
        for subject in subjects.into_iter().filter(|s| Self::is_reply(s)) {
            let clean = Self::clean_subject(subject);
            let id = Self::conversation_id(&clean);
            self.by_subject.entry(clean).or_insert(id);
        }
        self.by_subject.len() - before
    }

    /// Conversation id for an email with `subject`, opening one if it is a reply.
    pub fn assign(&mut self, subject: &str) -> Option<String> {
        let clean = Self::clean_subject(subject);
        if let Some(id) = self.by_subject.get(&clean) {
            return Some(id.clone());
        }
        if !Self::is_reply(subject) {
            return None;
        }
        let id = Self::conversation_id(&clean);
        self.by_subject.insert(clean, id.clone());
        Some(id)
    }

    #[must_use]
    pub fn get(&self, subject: &str) -> Option<&str> {
        self.by_subject
            .get(&Self::clean_subject(subject))
            .map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_subject
            .iter()
            .map(|(s, id)| (s.as_str(), id.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_subject.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty()
    }
}

static QUOTE_MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex patterns validated at compile time"
)]
fn quote_markers() -> &'static [Regex] {
    QUOTE_MARKERS.get_or_init(|| {
        [
            r"On (.*?)wrote: ",
            r"-----Original Message-----",
            r"(>>+|> >+)",
            r"(([_-]{7,})(.*)From:(.*)Sent:(.*)To:(.*)Subject:)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Static regex pattern is guaranteed to be valid"))
        .collect()
    })
}

/// Body of an email without the quoted history of earlier messages.
///
/// Whitespace runs (newlines included) collapse to single spaces, then the
/// text is cut at the first reply header or quote marker.
#[must_use]
pub fn clean_email_body(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = quote_markers()
        .iter()
        .filter_map(|re| re.find(&flat).map(|m| m.start()))
        .min()
        .unwrap_or(flat.len());
    flat[..cut].trim_end().to_string()
}
