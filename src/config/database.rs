//! Database configuration module.
//!
//! Handles the connection to the relational store behind the gateway and the
//! creation of its tables from the entity definitions. Table creation uses
//! `IF NOT EXISTS`, so it is safe to run on every start.

use crate::entities::{Category, Profile, Reminder, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/finance_dashboard.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var(DATABASE_URL_VAR).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates the `categories`, `transactions`, `reminders` and `profiles` tables
/// if they do not exist yet.
///
/// # Arguments
/// * `db` - Database connection
///
/// # Errors
/// Returns [`crate::errors::Error::Database`] if a `CREATE TABLE` statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, Reminder).await?;
    create_table(db, &schema, Profile).await?;

    Ok(())
}
