//! Persisted lexical indexes, one row per indexed document.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "index_terms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub corpus: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub document_id: String,
    /// Hash of the indexed text at build time.
    pub fingerprint: String,
    /// Normalized terms joined by `", "`.
    #[sea_orm(column_type = "Text")]
    pub terms: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
