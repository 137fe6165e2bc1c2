//! Transaction entity - One income or expense entry owned by a user.
//!
//! `occurred_on` is stored as `YYYY-MM-DD` text and `amount` is nullable, so rows
//! written by other clients may carry values the dashboard has to coerce.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// Calendar date of the transaction, `YYYY-MM-DD`
    pub occurred_on: String,
    /// Where the money was spent or received
    pub establishment: Option<String>,
    /// Unsigned amount, direction is carried by `kind`
    pub amount: Option<f64>,
    /// Free-form notes
    pub details: Option<String>,
    /// `"income"` or `"expense"`
    pub kind: String,
    /// Optional category reference
    pub category_id: Option<i64>,
    /// Owning user id
    pub owner_id: String,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction may belong to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
