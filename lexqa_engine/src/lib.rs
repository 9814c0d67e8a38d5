#![warn(
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
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod bm25;
pub mod extractor;
pub mod index;
pub mod mining;
pub mod normalize;
pub mod orchestrator;
pub mod storage;
#[cfg(test)]
mod testing;

pub use bm25::{Bm25, Bm25Params};
pub use extractor::{AnswerExtractor, ExtractorSettings};
pub use index::{ContextSource, IndexSpec, LexicalIndex};
pub use mining::{ConversationRegistry, MiningReport, QuestionMiner, mine_origin};
pub use normalize::TextNormalizer;
pub use orchestrator::{AnswerOrchestrator, AskOptions};
pub use storage::Store;
