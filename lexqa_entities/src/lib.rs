//! `SeaORM` entities for every table the engine reads or writes.

pub mod answers;
pub mod conversations;
pub mod docs;
pub mod emails;
pub mod faq;
pub mod index_terms;
pub mod issue_comments;
pub mod issues;
pub mod questions;
