//! Two-pass regex question detection.
//!
//! Pass 1 is case-sensitive and catches well-formed questions: a
//! capitalized word, no further capitals, a trailing `?`. Every pass-1 match
//! is blanked out with spaces of the same byte length so that offsets stay
//! valid. Pass 2 runs over a lower-cased copy of the blanked text and
//! catches questions led by a fixed set of interrogative words.

use std::sync::OnceLock;

use lexqa_core::{Origin, Question};
use regex::Regex;
use tracing::debug;

use super::sentences::sentence_spans;

static WELL_FORMED: OnceLock<Regex> = OnceLock::new();
static LEAD_WORD: OnceLock<Regex> = OnceLock::new();
static EXCEPTION: OnceLock<Regex> = OnceLock::new();

/// Capitalized first word, no further capitals, trailing `?`.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn well_formed() -> &'static Regex {
    WELL_FORMED.get_or_init(|| {
        Regex::new(r"[A-Z][a-z][^A-Z]*[?]$").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// An interrogative lead word anywhere before a trailing `?`. Expects lower-cased input.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn lead_word() -> &'static Regex {
    LEAD_WORD.get_or_init(|| {
        Regex::new(
            r"(how |wh|can |could |do |does |should |would |may |is |are |have |has |will |am ).*[?]$",
        )
        .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn exception() -> &'static Regex {
    EXCEPTION.get_or_init(|| {
        Regex::new(r"(https|http|www)[^ ]*").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Finds interrogative spans in free text and types them by origin.
#[derive(Debug, Clone, Copy)]
pub struct QuestionMiner {
    origin: Origin,
}

impl QuestionMiner {
    #[must_use]
    pub const fn new(origin: Origin) -> Self {
        Self { origin }
    }

    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// Questions in `text`, ordered by start offset.
    ///
    /// For every returned question `text[q.start..q.end] == q.text`.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<Question> {
        let mut working = text.to_string();
        let mut spans = Vec::new();

        for span in find_questions(&working, well_formed()) {
            erase(&mut working, span);
            spans.push(span);
        }

        let lowered = lowercase_in_place(&working);
        spans.extend(find_questions(&lowered, lead_word()));
        spans.sort_unstable();

        spans
            .into_iter()
            .map(|(start, end)| Question::new(text[start..end].to_string(), start, end, self.origin))
            .collect()
    }
}

/// Matches of `pattern` per sentence of `text`, as absolute byte spans.
fn find_questions(text: &str, pattern: &Regex) -> Vec<(usize, usize)> {
    let exceptions = exception_matches(text);
    let mut found = Vec::new();

    for (sentence_start, sentence_end) in sentence_spans(text) {
        let sentence = &text[sentence_start..sentence_end];
        let Some(m) = pattern.find(sentence) else {
            continue;
        };
        if let Some(exception) = matching_exception(&exceptions, m.as_str()) {
            debug!("Skipping question {:?} inside {:?}", m.as_str(), exception);
            continue;
        }
        found.push((sentence_start + m.start(), sentence_start + m.end()));
    }
    found
}

fn exception_matches(text: &str) -> Vec<String> {
    exception()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn matching_exception<'a>(exceptions: &'a [String], candidate: &str) -> Option<&'a str> {
    let candidate = candidate.to_lowercase();
    exceptions
        .iter()
        .find(|e| e.contains(&candidate))
        .map(String::as_str)
}

/// Overwrite `span` with spaces, keeping the byte length of `text`.
fn erase(text: &mut String, (start, end): (usize, usize)) {
    let before = text.len();
    text.replace_range(start..end, &" ".repeat(end - start));
    assert_eq!(text.len(), before, "erasing a question changed the text length");
}

/// Lower-case `text` without moving any byte offset.
///
/// Characters whose lower-case form has a different UTF-8 length are kept
/// as they are.
fn lowercase_in_place(text: &str) -> String {
    let mut lowered = String::with_capacity(text.len());
    for c in text.chars() {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if l.len_utf8() == c.len_utf8() => lowered.push(l),
            _ => lowered.push(c),
        }
    }
    lowered
}
