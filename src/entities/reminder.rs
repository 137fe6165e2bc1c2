//! Reminder entity - A bill or payment due on a given date.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reminder database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    /// Unique identifier for the reminder
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// Owning user id
    pub owner_id: String,
    /// What the reminder is about
    pub description: String,
    /// Due date, `YYYY-MM-DD`
    pub due_on: String,
    /// Expected amount
    pub amount: Option<f64>,
}

/// Reminders have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
