use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};

use super::services::{analyze_users_spending, InsightRun};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TaskReport {
    pub status: &'static str,
    #[serde(flatten)]
    pub run: InsightRun,
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/tasks/analyze-spending/:secret", post(analyze_spending))
}

/// POST /tasks/analyze-spending/:secret
/// Runs the analysis inline and reports the counters.
#[instrument(skip_all)]
pub async fn analyze_spending(
    State(state): State<AppState>,
    Path(secret): Path<String>,
) -> Result<Json<TaskReport>, StatusCode> {
    match state.config.trigger_secret.as_deref() {
        Some(expected) if expected == secret => {}
        _ => {
            warn!("analyze-spending trigger rejected");
            return Err(StatusCode::FORBIDDEN);
        }
    }
    let run = analyze_users_spending(&state).await;
    Ok(Json(TaskReport {
        status: "completed",
        run,
    }))
}
