#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod answer;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod question;
pub mod repository;
pub mod util;

pub use answer::{Answer, AnswerOrigin, AnswerSpan, FAQ_SOURCE_MODEL, Label};
pub use corpus::{CorpusKind, Document, Faq, IndexEntry, Passage};
pub use error::{Error, Result};
pub use extract::{ExtractionParams, SpanCandidate, SpanExtractor};
pub use question::{ContextResolver, ContextResolvers, Origin, Question};
pub use repository::{AnswerRepo, IndexStore};
pub use util::{short_hash, user_question_id};
