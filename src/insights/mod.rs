pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::spawn_scheduler;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::task_routes())
}
