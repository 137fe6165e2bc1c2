//! Relational gateway built on `SeaORM`.
//!
//! Each [`Query`] is translated into a `Select` on the matching entity, filters
//! and ordering are applied by column name, and rows come back as JSON objects so
//! the record layer sees the same loose shape any other backend would return.

use super::{Collection, DataGateway, FilterOp, GatewayError, Query, Row, SortDirection};
use crate::entities::{Category, Profile, Reminder, Transaction};
use sea_orm::{
    DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Alias, Expr, SimpleExpr},
};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

/// Gateway that reads from a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SeaOrmGateway {
    db: DatabaseConnection,
}

impl SeaOrmGateway {
    /// Wraps an established connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn run<E: EntityTrait>(
        &self,
        select: Select<E>,
        query: &Query,
    ) -> Result<Vec<Row>, GatewayError> {
        let select = apply_query(select, query)?;
        select
            .into_json()
            .all(&self.db)
            .await
            .map_err(|e| GatewayError::new(e.to_string()))
    }
}

impl DataGateway for SeaOrmGateway {
    #[instrument(skip(self), fields(collection = %query.collection))]
    async fn execute(&self, query: &Query) -> Result<Vec<Row>, GatewayError> {
        let rows = match query.collection {
            Collection::Transactions => self.run(Transaction::find(), query).await?,
            Collection::Reminders => self.run(Reminder::find(), query).await?,
            Collection::Categories => self.run(Category::find(), query).await?,
            Collection::Profiles => self.run(Profile::find(), query).await?,
        };
        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }
}

fn apply_query<E: EntityTrait>(
    mut select: Select<E>,
    query: &Query,
) -> Result<Select<E>, GatewayError> {
    for filter in &query.filters {
        let column = Expr::col(Alias::new(filter.field.as_str()));
        let value = to_db_value(&filter.value)?;
        let condition = match filter.op {
            FilterOp::Eq => column.eq(value),
            FilterOp::Gte => column.gte(value),
            FilterOp::Lte => column.lte(value),
        };
        select = select.filter(condition);
    }

    for sort in &query.order {
        let column = SimpleExpr::from(Expr::col(Alias::new(sort.field.as_str())));
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        select = select.order_by(column, order);
    }

    if let Some(limit) = query.limit {
        select = select.limit(limit);
    }

    Ok(select)
}

fn to_db_value(value: &JsonValue) -> Result<sea_orm::Value, GatewayError> {
    match value {
        JsonValue::String(s) => Ok(sea_orm::Value::from(s.clone())),
        JsonValue::Bool(b) => Ok(sea_orm::Value::from(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(sea_orm::Value::from)
            .or_else(|| n.as_f64().map(sea_orm::Value::from))
            .ok_or_else(|| GatewayError::new(format!("unsupported numeric filter value {n}"))),
        other => Err(GatewayError::new(format!(
            "unsupported filter value {other}"
        ))),
    }
}
