pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::alignment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/align", post(handlers::handle_align))
        .route("/history", get(handlers::handle_history))
        .with_state(state)
}
