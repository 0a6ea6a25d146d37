mod dto;
pub mod handlers;
mod replies;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::webhook_routes())
}
