//! Route modules.

pub mod health;
pub mod visitor_stats;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router. The binary adds tracing and CORS
/// layers on top.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/visitor-stats", visitor_stats::router(&state))
        .with_state(state)
}
