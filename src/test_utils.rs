//! Shared test utilities.
//!
//! Provides an in-memory `SQLite` setup with row insert helpers, JSON row and
//! record builders, and [`MemoryGateway`], a scripted gateway that can leak
//! foreign rows, fail a collection or hold a query open until released.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::core::records::{ReminderRecord, TransactionKind, TransactionRecord};
use crate::entities::{category, profile, reminder, transaction};
use crate::errors::Result;
use crate::gateway::{
    Collection, DataGateway, FilterOp, GatewayError, Query, Row, SortDirection,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::io;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory log sink filled by [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local subscriber and returns what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();
    let output = tracing::subscriber::with_default(subscriber, f);
    (output, logs)
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts an uncategorised transaction.
pub async fn insert_transaction(
    db: &DatabaseConnection,
    owner_id: &str,
    occurred_on: &str,
    amount: Option<f64>,
    kind: &str,
) -> Result<transaction::Model> {
    insert_transaction_in_category(db, owner_id, occurred_on, amount, kind, None).await
}

/// Inserts a transaction with an optional category reference.
pub async fn insert_transaction_in_category(
    db: &DatabaseConnection,
    owner_id: &str,
    occurred_on: &str,
    amount: Option<f64>,
    kind: &str,
    category_id: Option<i64>,
) -> Result<transaction::Model> {
    let model = transaction::ActiveModel {
        created_at: Set(Utc::now()),
        occurred_on: Set(occurred_on.to_string()),
        establishment: Set(Some("Test establishment".to_string())),
        amount: Set(amount),
        details: Set(None),
        kind: Set(kind.to_string()),
        category_id: Set(category_id),
        owner_id: Set(owner_id.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a reminder.
pub async fn insert_reminder(
    db: &DatabaseConnection,
    owner_id: &str,
    due_on: &str,
    amount: Option<f64>,
) -> Result<reminder::Model> {
    let model = reminder::ActiveModel {
        created_at: Set(Utc::now()),
        owner_id: Set(owner_id.to_string()),
        description: Set("Test reminder".to_string()),
        due_on: Set(due_on.to_string()),
        amount: Set(amount),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a category.
pub async fn insert_category(db: &DatabaseConnection, name: &str) -> Result<category::Model> {
    let model = category::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a profile keyed by user id.
pub async fn insert_profile(
    db: &DatabaseConnection,
    user_id: &str,
    name: Option<&str>,
) -> Result<profile::Model> {
    let model = profile::ActiveModel {
        id: Set(user_id.to_string()),
        name: Set(name.map(str::to_string)),
        phone: Set(None),
        avatar_url: Set(None),
    };
    Ok(model.insert(db).await?)
}

/// JSON row shaped like a `transactions` row from the backend.
pub fn transaction_row(id: i64, owner_id: &str, occurred_on: &str, amount: Value, kind: &str) -> Row {
    json!({
        "id": id,
        "occurred_on": occurred_on,
        "establishment": null,
        "amount": amount,
        "details": null,
        "kind": kind,
        "category_id": null,
        "owner_id": owner_id,
    })
}

/// JSON row shaped like a `reminders` row from the backend.
pub fn reminder_row(id: i64, owner_id: &str, due_on: &str, amount: Value) -> Row {
    json!({
        "id": id,
        "owner_id": owner_id,
        "description": format!("Reminder {id}"),
        "due_on": due_on,
        "amount": amount,
    })
}

/// Validated transaction with sensible defaults.
pub fn transaction_record(
    id: i64,
    owner_id: &str,
    occurred_on: Option<NaiveDate>,
    amount: &str,
    kind: TransactionKind,
) -> TransactionRecord {
    TransactionRecord {
        id,
        created_at: None,
        occurred_on,
        establishment: None,
        details: None,
        amount: Decimal::from_str(amount).unwrap(),
        kind,
        category_id: None,
        category_name: None,
        owner_id: owner_id.to_string(),
    }
}

/// Validated reminder with sensible defaults.
pub fn reminder_record(id: i64, owner_id: &str, due_on: Option<NaiveDate>) -> ReminderRecord {
    ReminderRecord {
        id,
        owner_id: owner_id.to_string(),
        description: format!("Reminder {id}"),
        due_on,
        amount: Decimal::ONE,
    }
}

/// Scripted in-memory gateway.
#[derive(Default)]
pub struct MemoryGateway {
    collections: HashMap<Collection, Vec<Row>>,
    ignored_fields: HashSet<String>,
    failures: HashMap<Collection, String>,
    holds: Mutex<HashMap<Collection, oneshot::Receiver<()>>>,
    executed: Mutex<Vec<Query>>,
}

impl MemoryGateway {
    /// Gateway with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `rows` for `collection`.
    pub fn with_rows(mut self, collection: Collection, rows: Vec<Row>) -> Self {
        self.collections.insert(collection, rows);
        self
    }

    /// Ignores filters on `field`, like a backend with a broken access policy.
    pub fn ignoring_filter(mut self, field: &str) -> Self {
        self.ignored_fields.insert(field.to_string());
        self
    }

    /// Makes every query on `collection` fail with `message`.
    pub fn failing(mut self, collection: Collection, message: &str) -> Self {
        self.failures.insert(collection, message.to_string());
        self
    }

    /// Holds the next query on `collection` until the returned sender fires.
    pub fn hold(&self, collection: Collection) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(collection, rx);
        tx
    }

    /// Queries executed so far, in order.
    pub fn executed_queries(&self) -> Vec<Query> {
        self.executed.lock().unwrap().clone()
    }

    fn matches(&self, row: &Row, query: &Query) -> bool {
        query
            .filters
            .iter()
            .filter(|f| !self.ignored_fields.contains(&f.field))
            .all(|f| {
                let Some(value) = row.get(&f.field) else {
                    return false;
                };
                let ordering = compare(value, &f.value);
                match f.op {
                    FilterOp::Eq => ordering == Some(Ordering::Equal),
                    FilterOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                    FilterOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                }
            })
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl DataGateway for MemoryGateway {
    async fn execute(&self, query: &Query) -> std::result::Result<Vec<Row>, GatewayError> {
        self.executed.lock().unwrap().push(query.clone());
        let hold = self.holds.lock().unwrap().remove(&query.collection);
        if let Some(released) = hold {
            let _ = released.await;
        }

        if let Some(message) = self.failures.get(&query.collection) {
            return Err(GatewayError::new(message.clone()));
        }

        let mut rows: Vec<Row> = self
            .collections
            .get(&query.collection)
            .map(|rows| rows.iter().filter(|r| self.matches(r, query)).cloned().collect())
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            query.order.iter().fold(Ordering::Equal, |acc, sort| {
                acc.then_with(|| {
                    let ordering = match (a.get(&sort.field), b.get(&sort.field)) {
                        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                        _ => Ordering::Equal,
                    };
                    match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
            })
        });

        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }
}
