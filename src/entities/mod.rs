//! Entity module - SeaORM definitions for the tables the dashboard reads.
//! The dashboard never writes these tables itself; the entities exist so the
//! relational gateway can address them and so tests can seed rows.

pub mod category;
pub mod profile;
pub mod reminder;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
pub use reminder::{Column as ReminderColumn, Entity as Reminder, Model as ReminderModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
