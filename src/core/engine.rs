//! Aggregation engine - fetches the scoped records and builds the summary.
//!
//! Given an owner and a period, the engine issues the transactions, reminders
//! and (optionally) categories queries concurrently, decodes the rows and hands
//! them to [`summarize`]. The first failing query aborts the whole aggregation,
//! so callers only ever see a complete summary or an error. No results are
//! cached between calls.

use super::aggregate::{DashboardSummary, SummaryInputs, summarize};
use super::period::Period;
use super::records::{
    self, ProfileRecord, decode_categories, decode_profiles, decode_reminders,
    decode_transactions, fields,
};
use crate::config::dashboard::{DashboardConfig, ReminderWindow, TransactionOrder};
use crate::errors::{Error, Result};
use crate::gateway::{Collection, DataGateway, Query, Row, SortDirection};
use chrono::NaiveDate;
use tracing::{debug, error, info, instrument};

/// Outcome of a successful aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Nobody is logged in; no query was issued
    NoIdentity,
    /// Summary for the requested owner and period
    Ready(DashboardSummary),
}

/// Fetches and reduces dashboard data through a [`DataGateway`].
#[derive(Debug, Clone)]
pub struct AggregationEngine<G> {
    gateway: G,
    config: DashboardConfig,
}

impl<G: DataGateway + Sync> AggregationEngine<G> {
    /// Creates an engine over `gateway` with the given options.
    pub const fn new(gateway: G, config: DashboardConfig) -> Self {
        Self { gateway, config }
    }

    /// Options in effect.
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Gateway the engine reads through.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Query for the owner's transactions inside `period`.
    pub fn transactions_query(&self, owner_id: &str, period: &Period) -> Query {
        let order_field = match self.config.transaction_order {
            TransactionOrder::OccurredOn => fields::OCCURRED_ON,
            TransactionOrder::CreatedAt => fields::CREATED_AT,
        };
        Query::from(Collection::Transactions)
            .eq(fields::OWNER_ID, owner_id)
            .gte(fields::OCCURRED_ON, period.lower_bound())
            .lte(fields::OCCURRED_ON, period.upper_bound())
            .order_by(order_field, SortDirection::Desc)
    }

    /// Query for the owner's reminders, scoped by the configured window.
    ///
    /// Carries no limit. The reminder limit is applied after owner isolation
    /// and date validation, in [`summarize`].
    pub fn reminders_query(&self, owner_id: &str, period: &Period, today: NaiveDate) -> Query {
        let query = Query::from(Collection::Reminders).eq(fields::OWNER_ID, owner_id);
        let query = match self.config.reminder_window {
            ReminderWindow::Period => query
                .gte(fields::DUE_ON, period.lower_bound())
                .lte(fields::DUE_ON, period.upper_bound()),
            ReminderWindow::Upcoming => {
                query.gte(fields::DUE_ON, today.format("%Y-%m-%d").to_string())
            }
        };
        query.order_by(fields::DUE_ON, SortDirection::Asc)
    }

    /// Query for the category lookup.
    pub fn categories_query() -> Query {
        Query::from(Collection::Categories).order_by(fields::NAME, SortDirection::Asc)
    }

    /// Builds the dashboard summary for `owner_id` over `period`.
    ///
    /// Returns [`Aggregation::NoIdentity`] without touching the gateway when
    /// `owner_id` is `None`.
    ///
    /// # Arguments
    /// * `owner_id` - Requesting user, `None` when logged out
    /// * `period` - Inclusive range for transactions, and for reminders in the
    ///   period window
    /// * `today` - Lower bound for reminders in the upcoming window
    ///
    /// # Defaults
    /// * transactions ordered by `occurred_on` descending
    /// * reminders limited to 5, scoped to `period`
    /// * category names resolved from the `categories` lookup
    ///
    /// # Errors
    /// [`Error::FetchFailed`] for the first query the gateway rejects. Malformed
    /// rows never fail the aggregation; they end up in `diagnostics`.
    #[instrument(skip(self, period), fields(start = %period.lower_bound(), end = %period.upper_bound()))]
    pub async fn aggregate(
        &self,
        owner_id: Option<&str>,
        period: &Period,
        today: NaiveDate,
    ) -> Result<Aggregation> {
        let Some(owner_id) = owner_id else {
            debug!("No authenticated user, skipping aggregation");
            return Ok(Aggregation::NoIdentity);
        };

        let transactions_query = self.transactions_query(owner_id, period);
        let reminders_query = self.reminders_query(owner_id, period, today);
        let categories_query = Self::categories_query();
        let categories = async {
            if self.config.resolve_categories {
                fetch(&self.gateway, &categories_query).await
            } else {
                Ok(Vec::new())
            }
        };

        let (transaction_rows, reminder_rows, category_rows) = tokio::try_join!(
            fetch(&self.gateway, &transactions_query),
            fetch(&self.gateway, &reminders_query),
            categories,
        )?;

        let transactions = decode_transactions(&transaction_rows);
        let reminders = decode_reminders(&reminder_rows);
        let categories = decode_categories(&category_rows);

        let mut diagnostics = transactions.diagnostics;
        diagnostics.extend(reminders.diagnostics);
        diagnostics.extend(categories.diagnostics);

        let summary = summarize(
            SummaryInputs {
                owner_id,
                period,
                today,
                config: &self.config,
            },
            transactions.records,
            reminders.records,
            &categories.records,
            diagnostics,
        );
        info!(
            transactions = summary.transactions.len(),
            reminders = summary.upcoming_reminders.len(),
            malformed = summary.diagnostics.len(),
            "Aggregated dashboard summary"
        );
        Ok(Aggregation::Ready(summary))
    }

    /// Fetches the owner's profile; `None` when logged out or when no row exists.
    #[instrument(skip(self))]
    pub async fn profile(&self, owner_id: Option<&str>) -> Result<Option<ProfileRecord>> {
        let Some(owner_id) = owner_id else {
            return Ok(None);
        };
        let query = Query::from(Collection::Profiles)
            .eq(fields::ID, owner_id)
            .limit(1);
        let rows = fetch(&self.gateway, &query).await?;
        let records::Decoded { records, .. } = decode_profiles(&rows);
        Ok(records.into_iter().find(|p| p.id == owner_id))
    }
}

async fn fetch<G: DataGateway>(gateway: &G, query: &Query) -> Result<Vec<Row>> {
    gateway.execute(query).await.map_err(|e| {
        error!("Query on {} failed: {}", query.collection, e);
        Error::FetchFailed {
            collection: query.collection,
            message: e.message,
        }
    })
}
