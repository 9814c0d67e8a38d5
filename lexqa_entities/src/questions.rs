//! Questions mined from emails, issues and issue comments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_id: String,
    #[sea_orm(column_type = "Text")]
    pub question: String,
    pub start: i64,
    pub end: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub context: Option<String>,
    /// Exactly one of the three origin keys is set.
    pub email_id: Option<i64>,
    pub issue_id: Option<i64>,
    pub comment_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
