//! Question mining: detection, email threading and the batch job.

pub mod detector;
mod job;
pub mod sentences;
mod threads;

pub use detector::QuestionMiner;
pub use job::{MiningReport, mine_origin};
pub use threads::{ConversationRegistry, clean_email_body};
