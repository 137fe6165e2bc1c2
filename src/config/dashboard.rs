//! Dashboard options loaded from the `[dashboard]` table of config.toml.
//!
//! Every field has a default, so an absent table or an absent file yields the
//! standard dashboard: five recent transactions, five reminders, clamped months,
//! reminders scoped to the period, ordering by transaction date.

use crate::core::period::PeriodPolicy;
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 5;

/// Which reminders appear on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderWindow {
    /// Reminders due inside the selected period
    #[default]
    Period,
    /// Reminders due today or later, no upper bound
    Upcoming,
}

/// Key used to order the recent-transactions list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrder {
    /// Transaction date, newest first
    #[default]
    OccurredOn,
    /// Insertion time, newest first
    CreatedAt,
}

/// Limits and modes used by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of recent transactions shown
    pub recent_limit: usize,
    /// Number of reminders shown
    pub reminder_limit: usize,
    /// How `YYYY-MM` month strings become periods
    pub period_policy: PeriodPolicy,
    /// Which reminders are eligible
    pub reminder_window: ReminderWindow,
    /// Ordering key for recent transactions
    pub transaction_order: TransactionOrder,
    /// Whether to fetch the category lookup
    pub resolve_categories: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_LIMIT,
            reminder_limit: DEFAULT_LIMIT,
            period_policy: PeriodPolicy::default(),
            reminder_window: ReminderWindow::default(),
            transaction_order: TransactionOrder::default(),
            resolve_categories: true,
        }
    }
}
