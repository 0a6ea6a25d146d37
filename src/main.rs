use std::time::Duration;

mod app;
mod bot;
mod clock;
mod config;
mod db;
mod error;
mod gemini;
mod insights;
mod state;
mod telegram;
#[cfg(test)]
mod testing;
mod transactions;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "financify=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    db::migrate(&app_state.db).await?;

    let every = Duration::from_secs(app_state.config.insight_interval_secs);
    insights::spawn_scheduler(app_state.clone(), every);

    app::serve(app::build_app(app_state)).await
}
