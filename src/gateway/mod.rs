//! Remote data gateway - the generic query surface the dashboard reads through.
//!
//! A [`Query`] names a [`Collection`] and carries equality and range filters,
//! ordering and a row limit. A [`DataGateway`] executes it and hands back
//! loosely-typed JSON rows; turning those into typed records is the job of
//! [`crate::core::records`].

/// SeaORM-backed gateway over the relational store
pub mod database;

pub use database::SeaOrmGateway;

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A single row as returned by the backend.
pub type Row = Value;

/// Named remote collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Income and expense entries
    Transactions,
    /// Upcoming bills
    Reminders,
    /// Category lookup
    Categories,
    /// User display details
    Profiles,
}

impl Collection {
    /// Table / collection name on the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Reminders => "reminders",
            Self::Categories => "categories",
            Self::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `field = value`
    Eq,
    /// `field >= value`
    Gte,
    /// `field <= value`
    Lte,
}

/// One filter clause; all clauses of a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column name
    pub field: String,
    /// Comparison
    pub op: FilterOp,
    /// Right-hand side
    pub value: Value,
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Column name
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

/// Builder for a read against one collection.
///
/// ```
/// use finance_dashboard::gateway::{Collection, Query, SortDirection};
///
/// let query = Query::from(Collection::Transactions)
///     .eq("owner_id", "user-1")
///     .gte("occurred_on", "2024-06-01")
///     .lte("occurred_on", "2024-06-30")
///     .order_by("occurred_on", SortDirection::Desc)
///     .limit(5);
/// assert_eq!(query.filters.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Target collection
    pub collection: Collection,
    /// AND-ed filters
    pub filters: Vec<Filter>,
    /// Ordering clauses, applied in sequence
    pub order: Vec<Sort>,
    /// Maximum number of rows
    pub limit: Option<u64>,
}

impl Query {
    /// Starts an unfiltered query against `collection`.
    #[must_use]
    pub const fn from(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    /// Equality filter.
    #[must_use]
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Lower inclusive bound.
    #[must_use]
    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    /// Upper inclusive bound.
    #[must_use]
    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    /// Appends an ordering clause.
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order.push(Sort {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Failure reported by a gateway: network, permission or malformed query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
    /// Backend message, passed through untouched
    pub message: String,
}

impl GatewayError {
    /// Wraps a backend message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes queries against the remote store.
pub trait DataGateway {
    /// Runs `query` and returns the matching rows or the backend's error.
    fn execute(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Row>, GatewayError>> + Send;
}
