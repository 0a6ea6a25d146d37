use std::time::Duration;

use serde::Serialize;
use time::Date;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::error::StorageError;
use crate::state::AppState;
use crate::transactions::repo;
use crate::users::User;

/// Counters for one pass over all users.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsightRun {
    pub users: usize,
    /// Users with spending in the window.
    pub analyzed: usize,
    /// Insights delivered.
    pub insights: usize,
    pub failures: usize,
}

enum Outcome {
    NoSpending,
    NothingNotable,
    Delivered,
}

async fn analyze_user(state: &AppState, user: &User, today: Date) -> Result<Outcome, StorageError> {
    let summary = repo::spending_summary_last_90_days(&state.db, user.id, today).await?;
    if summary.is_empty() {
        return Ok(Outcome::NoSpending);
    }
    let Some(insight) = state.extractor.generate_insight(&summary).await else {
        return Ok(Outcome::NothingNotable);
    };
    // private chats share the user's id
    state
        .messenger
        .send_message(user.telegram_id, &insight, None)
        .await;
    Ok(Outcome::Delivered)
}

/// Look at every user's last 90 days of spending and send whatever insight
/// the extractor finds. One user's failure is counted and the run moves on.
#[instrument(skip(state))]
pub async fn analyze_users_spending(state: &AppState) -> InsightRun {
    let mut run = InsightRun::default();
    let users = match User::all(&state.db).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "load users for insight run failed");
            run.failures += 1;
            report(state, &run).await;
            return run;
        }
    };
    run.users = users.len();
    let today = state.clock.today();

    for user in &users {
        match analyze_user(state, user, today).await {
            Ok(Outcome::NoSpending) => debug!(user_id = user.id, "no recent spending"),
            Ok(Outcome::NothingNotable) => {
                run.analyzed += 1;
                debug!(user_id = user.id, "nothing notable");
            }
            Ok(Outcome::Delivered) => {
                run.analyzed += 1;
                run.insights += 1;
                info!(user_id = user.id, "insight delivered");
            }
            Err(e) => {
                run.failures += 1;
                warn!(error = %e, user_id = user.id, "insight analysis failed");
            }
        }
        tokio::task::yield_now().await;
    }

    info!(
        users = run.users,
        analyzed = run.analyzed,
        insights = run.insights,
        failures = run.failures,
        "insight run completed"
    );
    report(state, &run).await;
    run
}

async fn report(state: &AppState, run: &InsightRun) {
    let Some(admin) = state.config.admin_telegram_id else {
        return;
    };
    let text = format!(
        "📋 *Análise de gastos concluída*\n\
         Usuários: {}\nAnalisados: {}\nInsights enviados: {}\nFalhas: {}",
        run.users, run.analyzed, run.insights, run.failures
    );
    state.messenger.send_message(admin, &text, None).await;
}

/// Run the analysis every `every`, first after one full period. `None` when
/// the period is zero.
pub fn spawn_scheduler(state: AppState, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        info!("insight scheduler disabled");
        return None;
    }
    info!(interval_secs = every.as_secs(), "insight scheduler started");
    Some(tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            analyze_users_spending(&state).await;
        }
    }))
}
