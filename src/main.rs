use dotenvy::dotenv;
use finance_dashboard::{
    config::{self, session::EnvSession},
    core::{
        dashboard::{DashboardParams, DashboardStore, DashboardView, ViewStatus},
        engine::AggregationEngine,
        period::Period,
    },
    errors::Result,
    gateway::SeaOrmGateway,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Connect to the store behind the gateway
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Pick the period: `YYYY-MM` argument or the current month
    let policy = app_config.dashboard.period_policy;
    let today = chrono::Local::now().date_naive();
    let period = match std::env::args().nth(1) {
        Some(month) => Period::parse_month(&month, policy)?,
        None => Period::month_containing(today, policy)?,
    };

    // 6. Aggregate once and print the view
    let engine = AggregationEngine::new(SeaOrmGateway::new(db), app_config.dashboard);
    let params = DashboardParams::from_session(&EnvSession, period, today);
    let profile = engine.profile(params.owner_id.as_deref()).await;
    let store = DashboardStore::new();
    store.refresh(&engine, params).await;

    let display_name = match profile {
        Ok(Some(profile)) => profile.name.unwrap_or(profile.id),
        Ok(None) => String::from("(no profile)"),
        Err(e) => {
            error!("Profile lookup failed: {}", e);
            String::from("(profile unavailable)")
        }
    };
    print_view(&display_name, &store.snapshot().await);

    Ok(())
}

fn print_view(display_name: &str, view: &DashboardView) {
    if let Some(notification) = &view.notification {
        println!("! {notification}");
    }
    match view.status {
        ViewStatus::Idle => println!("Nothing loaded."),
        ViewStatus::NoIdentity => {
            println!("Not signed in. Set DASHBOARD_USER_ID to see your dashboard.");
        }
        ViewStatus::Ready => {
            let summary = &view.summary;
            if let Some(params) = &view.params {
                println!(
                    "{display_name}: {} to {}",
                    params.period.start(),
                    params.period.end()
                );
            }
            println!("Income   {:>12.2}", summary.total_income);
            println!("Expenses {:>12.2}", summary.total_expense);
            println!("Balance  {:>12.2}", summary.balance());

            println!("\nRecent transactions");
            for t in &summary.recent_transactions {
                let date = t.occurred_on.map(|d| d.to_string()).unwrap_or_default();
                let label = t.establishment.as_deref().unwrap_or("-");
                println!("  {date}  {:?}  {:>10.2}  {label}", t.kind, t.amount);
            }

            println!("\nUpcoming reminders");
            for r in &summary.upcoming_reminders {
                let due = r.due_on.map(|d| d.to_string()).unwrap_or_default();
                println!("  {due}  {:>10.2}  {}", r.amount, r.description);
            }

            if !summary.expense_by_category.is_empty() {
                println!("\nSpending by category");
                for c in &summary.expense_by_category {
                    let name = c.name.as_deref().unwrap_or("Uncategorised");
                    println!("  {name:<20} {:>10.2}", c.total);
                }
            }

            if !summary.diagnostics.is_empty() {
                println!("\n{} malformed rows were tolerated", summary.diagnostics.len());
            }
        }
    }
}
