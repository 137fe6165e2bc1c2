//! Record decoding - turns loosely-typed gateway rows into validated records.
//!
//! Every problem found in a row becomes a [`MalformedRecord`] diagnostic.
//! Amounts that are missing or not numeric are coerced to zero, unparsable dates
//! become `None` (the record is still counted but cannot be ordered), and rows
//! that cannot be attributed or partitioned at all are dropped.

use crate::gateway::{Collection, Row};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::warn;

/// Column names used by the dashboard queries.
pub mod fields {
    /// Primary key
    pub const ID: &str = "id";
    /// Row owner
    pub const OWNER_ID: &str = "owner_id";
    /// Insertion timestamp
    pub const CREATED_AT: &str = "created_at";
    /// Transaction date
    pub const OCCURRED_ON: &str = "occurred_on";
    /// Reminder due date
    pub const DUE_ON: &str = "due_on";
    /// Monetary amount
    pub const AMOUNT: &str = "amount";
    /// Transaction direction
    pub const KIND: &str = "kind";
    /// Transaction category reference
    pub const CATEGORY_ID: &str = "category_id";
    /// Display name (categories, profiles)
    pub const NAME: &str = "name";
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Money received
    Income,
    /// Money spent
    Expense,
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction kind {other:?}")),
        }
    }
}

/// A validated transaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Unique identifier
    pub id: i64,
    /// Insertion time, if present and parsable
    pub created_at: Option<DateTime<Utc>>,
    /// Transaction date, if parsable
    pub occurred_on: Option<NaiveDate>,
    /// Where the money went or came from
    pub establishment: Option<String>,
    /// Free-form notes
    pub details: Option<String>,
    /// Amount, zero when the row carried none
    pub amount: Decimal,
    /// Income or expense
    pub kind: TransactionKind,
    /// Category reference
    pub category_id: Option<i64>,
    /// Category name resolved from the lookup
    pub category_name: Option<String>,
    /// Owning user
    pub owner_id: String,
}

/// A validated reminder row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRecord {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub owner_id: String,
    /// What is due
    pub description: String,
    /// Due date, if parsable
    pub due_on: Option<NaiveDate>,
    /// Amount, zero when the row carried none
    pub amount: Decimal,
}

/// A category lookup entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Display details of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    /// User id
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Avatar image location
    pub avatar_url: Option<String>,
}

/// A problem found while decoding a row. Never aborts an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {collection} row (id {id:?}): `{field}` {reason}")]
pub struct MalformedRecord {
    /// Collection the row came from
    pub collection: Collection,
    /// Row id, when it could be read
    pub id: Option<i64>,
    /// Offending field
    pub field: &'static str,
    /// What was wrong with it
    pub reason: String,
}

impl MalformedRecord {
    /// Logs the diagnostic at `warn` level and appends it to `diagnostics`.
    pub fn report_into(self, diagnostics: &mut Vec<Self>) {
        warn!("{self}");
        diagnostics.push(self);
    }
}

/// Decoded rows plus the diagnostics produced along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// Rows that could be used
    pub records: Vec<T>,
    /// Problems found, including those in dropped rows
    pub diagnostics: Vec<MalformedRecord>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Per-row reader that records diagnostics as it goes.
struct RowReader<'a> {
    collection: Collection,
    object: &'a Map<String, Value>,
    id: Option<i64>,
    diagnostics: &'a mut Vec<MalformedRecord>,
}

impl<'a> RowReader<'a> {
    fn open(
        collection: Collection,
        row: &'a Row,
        diagnostics: &'a mut Vec<MalformedRecord>,
    ) -> Option<Self> {
        let Some(object) = row.as_object() else {
            MalformedRecord {
                collection,
                id: None,
                field: "row",
                reason: format!("is not an object: {row}"),
            }
            .report_into(diagnostics);
            return None;
        };
        let id = object.get(fields::ID).and_then(as_integer);
        Some(Self {
            collection,
            object,
            id,
            diagnostics,
        })
    }

    fn report(&mut self, field: &'static str, reason: impl Into<String>) {
        MalformedRecord {
            collection: self.collection,
            id: self.id,
            field,
            reason: reason.into(),
        }
        .report_into(self.diagnostics);
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn id(&mut self) -> Option<i64> {
        if self.id.is_none() {
            self.report(fields::ID, "is missing or not an integer");
        }
        self.id
    }

    fn required_text(&mut self, field: &'static str) -> Option<String> {
        let value = self.get(field).and_then(as_text);
        if value.is_none() {
            self.report(field, "is missing");
        }
        value
    }

    fn optional_text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(as_text)
    }

    fn optional_integer(&mut self, field: &'static str) -> Option<i64> {
        let value = self.get(field)?;
        let parsed = as_integer(value);
        if parsed.is_none() {
            self.report(field, format!("is not an integer: {value}"));
        }
        parsed
    }

    fn amount(&mut self) -> Decimal {
        match self.get(fields::AMOUNT) {
            None => {
                self.report(fields::AMOUNT, "is missing, counted as 0");
                Decimal::ZERO
            }
            Some(value) => as_decimal(value).unwrap_or_else(|| {
                self.report(fields::AMOUNT, format!("is not numeric ({value}), counted as 0"));
                Decimal::ZERO
            }),
        }
    }

    fn date(&mut self, field: &'static str) -> Option<NaiveDate> {
        let Some(value) = self.get(field) else {
            self.report(field, "is missing");
            return None;
        };
        let parsed = value.as_str().and_then(parse_date);
        if parsed.is_none() {
            self.report(field, format!("is not a date: {value}"));
        }
        parsed
    }

    fn timestamp(&mut self, field: &'static str) -> Option<DateTime<Utc>> {
        let value = self.get(field)?;
        let parsed = value.as_str().and_then(parse_timestamp);
        if parsed.is_none() {
            self.report(field, format!("is not a timestamp: {value}"));
        }
        parsed
    }
}

/// Decodes `transactions` rows.
#[must_use]
pub fn decode_transactions(rows: &[Row]) -> Decoded<TransactionRecord> {
    let mut decoded = Decoded::default();
    for row in rows {
        let Some(mut reader) = RowReader::open(Collection::Transactions, row, &mut decoded.diagnostics)
        else {
            continue;
        };
        let id = reader.id();
        let owner_id = reader.required_text(fields::OWNER_ID);
        let kind = match reader.get(fields::KIND).and_then(as_text) {
            Some(text) => match text.parse::<TransactionKind>() {
                Ok(kind) => Some(kind),
                Err(reason) => {
                    reader.report(fields::KIND, reason);
                    None
                }
            },
            None => {
                reader.report(fields::KIND, "is missing");
                None
            }
        };
        let amount = reader.amount();
        let occurred_on = reader.date(fields::OCCURRED_ON);
        let created_at = reader.timestamp(fields::CREATED_AT);
        let category_id = reader.optional_integer(fields::CATEGORY_ID);

        let (Some(id), Some(owner_id), Some(kind)) = (id, owner_id, kind) else {
            continue;
        };
        decoded.records.push(TransactionRecord {
            id,
            created_at,
            occurred_on,
            establishment: reader.optional_text("establishment"),
            details: reader.optional_text("details"),
            amount,
            kind,
            category_id,
            category_name: None,
            owner_id,
        });
    }
    decoded
}

/// Decodes `reminders` rows.
#[must_use]
pub fn decode_reminders(rows: &[Row]) -> Decoded<ReminderRecord> {
    let mut decoded = Decoded::default();
    for row in rows {
        let Some(mut reader) = RowReader::open(Collection::Reminders, row, &mut decoded.diagnostics)
        else {
            continue;
        };
        let id = reader.id();
        let owner_id = reader.required_text(fields::OWNER_ID);
        let amount = reader.amount();
        let due_on = reader.date(fields::DUE_ON);

        let (Some(id), Some(owner_id)) = (id, owner_id) else {
            continue;
        };
        decoded.records.push(ReminderRecord {
            id,
            owner_id,
            description: reader.optional_text("description").unwrap_or_default(),
            due_on,
            amount,
        });
    }
    decoded
}

/// Decodes `categories` rows.
#[must_use]
pub fn decode_categories(rows: &[Row]) -> Decoded<CategoryRecord> {
    let mut decoded = Decoded::default();
    for row in rows {
        let Some(mut reader) =
            RowReader::open(Collection::Categories, row, &mut decoded.diagnostics)
        else {
            continue;
        };
        if let (Some(id), Some(name)) = (reader.id(), reader.required_text(fields::NAME)) {
            decoded.records.push(CategoryRecord { id, name });
        }
    }
    decoded
}

/// Decodes `profiles` rows. Profile ids are user ids, so they are text.
#[must_use]
pub fn decode_profiles(rows: &[Row]) -> Decoded<ProfileRecord> {
    let mut decoded = Decoded::default();
    for row in rows {
        let Some(mut reader) = RowReader::open(Collection::Profiles, row, &mut decoded.diagnostics)
        else {
            continue;
        };
        let Some(id) = reader.required_text(fields::ID) else {
            continue;
        };
        decoded.records.push(ProfileRecord {
            id,
            name: reader.optional_text(fields::NAME),
            phone: reader.optional_text("phone"),
            avatar_url: reader.optional_text("avatar_url"),
        });
    }
    decoded
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses a monetary amount. Numbers go through their textual form so `0.1`
/// stays exactly `0.1`.
fn as_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Timestamps sometimes leak into date columns
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}
