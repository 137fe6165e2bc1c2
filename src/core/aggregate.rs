//! Aggregation - reduces validated records into a [`DashboardSummary`].
//!
//! Everything here is pure: the engine fetches and decodes, then hands the
//! records to [`summarize`]. Owner isolation is enforced again at this point so
//! a gateway that ignores its `owner_id` filter still cannot leak foreign rows
//! into the totals.

use super::period::Period;
use super::records::{
    CategoryRecord, MalformedRecord, ReminderRecord, TransactionKind, TransactionRecord, fields,
};
use crate::config::dashboard::{DashboardConfig, ReminderWindow, TransactionOrder};
use crate::gateway::Collection;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::warn;

/// Income and expense totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of income amounts
    pub income: Decimal,
    /// Sum of expense amounts
    pub expense: Decimal,
}

impl Totals {
    /// `income - expense`, always derived from the two sums. Saturates at the
    /// `Decimal` range.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }
}

/// Expense total for one category; `category_id` is `None` for uncategorised spending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Category reference
    pub category_id: Option<i64>,
    /// Resolved name, when the lookup knew it
    pub name: Option<String>,
    /// Sum of expenses in this category
    pub total: Decimal,
}

/// The derived dashboard view-model. Values are raw; formatting is left to the
/// presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    /// Sum of income in the period
    pub total_income: Decimal,
    /// Sum of expenses in the period
    pub total_expense: Decimal,
    /// Most recent first, truncated to the display limit
    pub recent_transactions: Vec<TransactionRecord>,
    /// Soonest first, truncated to the display limit
    pub upcoming_reminders: Vec<ReminderRecord>,
    /// Expenses grouped by category, largest first
    pub expense_by_category: Vec<CategoryTotal>,
    /// Every owned transaction in the period, for detail views
    pub transactions: Vec<TransactionRecord>,
    /// Problems found while decoding rows
    pub diagnostics: Vec<MalformedRecord>,
}

impl DashboardSummary {
    /// `total_income - total_expense`, saturating like [`Totals::balance`].
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.total_income.saturating_sub(self.total_expense)
    }
}

/// Adds `record.amount` to `total`. An amount that would overflow is left out
/// and reported instead.
fn accumulate(
    total: &mut Decimal,
    record: &TransactionRecord,
    sum_name: &str,
    diagnostics: &mut Vec<MalformedRecord>,
) {
    match total.checked_add(record.amount) {
        Some(sum) => *total = sum,
        None => MalformedRecord {
            collection: Collection::Transactions,
            id: Some(record.id),
            field: fields::AMOUNT,
            reason: format!("{} overflows the {sum_name}, left out", record.amount),
        }
        .report_into(diagnostics),
    }
}

/// Sums transaction amounts per kind.
///
/// # Arguments
/// * `transactions` - Records to sum, already scoped to one owner
/// * `diagnostics` - Receives a [`MalformedRecord`] for every amount that would
///   overflow its sum; such amounts are skipped
#[must_use]
pub fn totals(
    transactions: &[TransactionRecord],
    diagnostics: &mut Vec<MalformedRecord>,
) -> Totals {
    let mut acc = Totals::default();
    for t in transactions {
        match t.kind {
            TransactionKind::Income => {
                accumulate(&mut acc.income, t, "income total", diagnostics);
            }
            TransactionKind::Expense => {
                accumulate(&mut acc.expense, t, "expense total", diagnostics);
            }
        }
    }
    acc
}

/// Keeps only records owned by `owner_id`, logging anything dropped.
pub fn retain_owned<T>(records: &mut Vec<T>, owner_id: &str, owner_of: impl Fn(&T) -> &str) {
    let before = records.len();
    records.retain(|r| owner_of(r) == owner_id);
    let dropped = before - records.len();
    if dropped > 0 {
        warn!("Dropped {dropped} rows not owned by the requesting user");
    }
}

/// Orders transactions most recent first and keeps at most `limit`.
/// Records without the ordering key are left out.
#[must_use]
pub fn recent_transactions(
    transactions: &[TransactionRecord],
    order: TransactionOrder,
    limit: usize,
) -> Vec<TransactionRecord> {
    let mut ordered: Vec<TransactionRecord> = match order {
        TransactionOrder::OccurredOn => transactions
            .iter()
            .filter(|t| t.occurred_on.is_some())
            .cloned()
            .collect(),
        TransactionOrder::CreatedAt => transactions
            .iter()
            .filter(|t| t.created_at.is_some())
            .cloned()
            .collect(),
    };
    match order {
        TransactionOrder::OccurredOn => {
            ordered.sort_by_key(|t| Reverse((t.occurred_on, t.id)));
        }
        TransactionOrder::CreatedAt => {
            ordered.sort_by_key(|t| Reverse((t.created_at, t.id)));
        }
    }
    ordered.truncate(limit);
    ordered
}

/// Orders reminders soonest first, keeps those inside the window and at most `limit`.
#[must_use]
pub fn upcoming_reminders(
    reminders: &[ReminderRecord],
    window: ReminderWindow,
    period: &Period,
    today: NaiveDate,
    limit: usize,
) -> Vec<ReminderRecord> {
    let mut eligible: Vec<ReminderRecord> = reminders
        .iter()
        .filter(|r| {
            r.due_on.is_some_and(|due| match window {
                ReminderWindow::Period => period.contains(due),
                ReminderWindow::Upcoming => due >= today,
            })
        })
        .cloned()
        .collect();
    eligible.sort_by_key(|r| (r.due_on, r.id));
    eligible.truncate(limit);
    eligible
}

/// Groups expenses by category, largest total first, ties by name. Amounts that
/// would overflow their category total are skipped and reported.
#[must_use]
pub fn expense_by_category(
    transactions: &[TransactionRecord],
    diagnostics: &mut Vec<MalformedRecord>,
) -> Vec<CategoryTotal> {
    let mut groups: HashMap<Option<i64>, CategoryTotal> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        let entry = groups.entry(t.category_id).or_insert_with(|| CategoryTotal {
            category_id: t.category_id,
            name: t.category_name.clone(),
            total: Decimal::ZERO,
        });
        accumulate(&mut entry.total, t, "category total", diagnostics);
    }
    let mut grouped: Vec<CategoryTotal> = groups.into_values().collect();
    grouped.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    grouped
}

/// Fills `category_name` from the lookup.
pub fn resolve_categories(transactions: &mut [TransactionRecord], categories: &[CategoryRecord]) {
    let names: HashMap<i64, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();
    for t in transactions.iter_mut() {
        t.category_name = t
            .category_id
            .and_then(|id| names.get(&id))
            .map(|name| (*name).to_string());
    }
}

/// Everything [`summarize`] needs besides the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInputs<'a> {
    /// Requesting user
    pub owner_id: &'a str,
    /// Period the transactions were fetched for
    pub period: &'a Period,
    /// Reference date for the upcoming window
    pub today: NaiveDate,
    /// Limits and modes
    pub config: &'a DashboardConfig,
}

/// Builds the full summary from decoded records.
#[must_use]
pub fn summarize(
    inputs: SummaryInputs<'_>,
    mut transactions: Vec<TransactionRecord>,
    mut reminders: Vec<ReminderRecord>,
    categories: &[CategoryRecord],
    mut diagnostics: Vec<MalformedRecord>,
) -> DashboardSummary {
    retain_owned(&mut transactions, inputs.owner_id, |t| t.owner_id.as_str());
    retain_owned(&mut reminders, inputs.owner_id, |r| r.owner_id.as_str());
    resolve_categories(&mut transactions, categories);

    let Totals { income, expense } = totals(&transactions, &mut diagnostics);
    let recent = recent_transactions(
        &transactions,
        inputs.config.transaction_order,
        inputs.config.recent_limit,
    );
    let upcoming = upcoming_reminders(
        &reminders,
        inputs.config.reminder_window,
        inputs.period,
        inputs.today,
        inputs.config.reminder_limit,
    );

    let by_category = expense_by_category(&transactions, &mut diagnostics);

    DashboardSummary {
        total_income: income,
        total_expense: expense,
        recent_transactions: recent,
        upcoming_reminders: upcoming,
        expense_by_category: by_category,
        transactions,
        diagnostics,
    }
}
