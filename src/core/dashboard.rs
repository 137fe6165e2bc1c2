//! Dashboard state - the single-writer cell holding what the user currently sees.
//!
//! Every refresh is tagged with a generation number when it starts. A result is
//! applied only if no newer refresh has started since; anything else is a stale
//! response and is dropped, whatever order the fetches resolve in. Failures keep
//! the previous summary and attach a notification instead.

use super::aggregate::DashboardSummary;
use super::engine::{Aggregation, AggregationEngine};
use super::period::Period;
use super::session::SessionProvider;
use crate::errors::Result;
use crate::gateway::DataGateway;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Parameters a refresh is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardParams {
    /// Requesting user, `None` when logged out
    pub owner_id: Option<String>,
    /// Selected period
    pub period: Period,
    /// Reference date for upcoming reminders
    pub today: NaiveDate,
}

impl DashboardParams {
    /// Reads the owner from `session`.
    pub fn from_session<S: SessionProvider + ?Sized>(
        session: &S,
        period: Period,
        today: NaiveDate,
    ) -> Self {
        Self {
            owner_id: session.current_user().map(|user| user.id),
            period,
            today,
        }
    }
}

/// What kind of content the view holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing loaded yet
    #[default]
    Idle,
    /// No user logged in; summary is zeroed
    NoIdentity,
    /// Summary reflects `params`
    Ready,
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    /// Content status
    pub status: ViewStatus,
    /// Latest applied summary
    pub summary: DashboardSummary,
    /// Parameters the summary was computed for
    pub params: Option<DashboardParams>,
    /// User-visible message from the last failed refresh
    pub notification: Option<String>,
    /// Whether the newest refresh is still in flight
    pub loading: bool,
}

/// Handle for one in-flight refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    params: DashboardParams,
}

impl RequestTicket {
    /// Generation number assigned when the refresh began.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Parameters the refresh was issued for.
    #[must_use]
    pub const fn params(&self) -> &DashboardParams {
        &self.params
    }
}

/// What happened to a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result (or its failure notice) was written to the view
    Applied,
    /// A newer refresh had started; the result was dropped
    Discarded,
}

#[derive(Debug, Default)]
struct StoreState {
    latest: u64,
    view: DashboardView,
}

/// Shared owner of the current [`DashboardView`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct DashboardStore {
    state: Arc<RwLock<StoreState>>,
}

impl DashboardStore {
    /// Empty store: idle status, zero summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new refresh and supersedes every older one.
    pub async fn begin(&self, params: DashboardParams) -> RequestTicket {
        let mut state = self.state.write().await;
        state.latest += 1;
        state.view.loading = true;
        debug!("Refresh generation {} started", state.latest);
        RequestTicket {
            generation: state.latest,
            params,
        }
    }

    /// Whether `ticket` is still the newest refresh.
    pub async fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.state.read().await.latest == ticket.generation
    }

    /// Applies `outcome` if `ticket` is still the newest refresh.
    pub async fn complete(
        &self,
        ticket: RequestTicket,
        outcome: Result<Aggregation>,
    ) -> Completion {
        let mut state = self.state.write().await;
        if state.latest != ticket.generation {
            warn!(
                "Discarding stale response for generation {} (latest is {})",
                ticket.generation, state.latest
            );
            return Completion::Discarded;
        }

        let view = &mut state.view;
        view.loading = false;
        match outcome {
            Ok(Aggregation::Ready(summary)) => {
                view.summary = summary;
                view.status = ViewStatus::Ready;
                view.params = Some(ticket.params);
                view.notification = None;
            }
            Ok(Aggregation::NoIdentity) => {
                view.summary = DashboardSummary::default();
                view.status = ViewStatus::NoIdentity;
                view.params = Some(ticket.params);
                view.notification = None;
            }
            Err(e) => {
                // Previous summary stays on screen
                view.notification = Some(e.to_string());
            }
        }
        Completion::Applied
    }

    /// Copy of the current view.
    pub async fn snapshot(&self) -> DashboardView {
        self.state.read().await.view.clone()
    }

    /// Runs one full refresh: begin, aggregate, complete.
    ///
    /// # Arguments
    /// * `engine` - Engine to aggregate with
    /// * `params` - Owner, period and reference date for this refresh
    ///
    /// Returns [`Completion::Discarded`] when another refresh began while this
    /// one was in flight. A failed aggregation still counts as applied: the
    /// previous summary is kept and the error becomes the view's notification.
    pub async fn refresh<G: DataGateway + Sync>(
        &self,
        engine: &AggregationEngine<G>,
        params: DashboardParams,
    ) -> Completion {
        let ticket = self.begin(params).await;
        let outcome = {
            let params = ticket.params();
            engine
                .aggregate(params.owner_id.as_deref(), &params.period, params.today)
                .await
        };
        let completion = self.complete(ticket, outcome).await;
        if completion == Completion::Applied {
            info!("Dashboard view updated");
        }
        completion
    }
}
