//! Audit log of answers shown to users.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub answer_id: String,
    pub user_question_id: String,
    #[sea_orm(column_type = "Text")]
    pub user_question: String,
    #[sea_orm(column_type = "Text")]
    pub answer: String,
    pub start: i64,
    pub end: i64,
    pub confidence: Option<f64>,
    #[sea_orm(column_type = "Text")]
    pub extended_answer: String,
    pub extended_start: i64,
    pub extended_end: i64,
    pub model: String,
    pub origin: String,
    pub created_at: DateTimeUtc,
    /// 1 correct, 0 wrong, null unlabeled.
    pub label: Option<i32>,
    pub metadata: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
