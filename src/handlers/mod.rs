mod health;
mod metrics;
mod pages;

use axum::{Router, routing::get};
use std::sync::Arc;
use crate::state::AppState;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use pages::{index_handler, page_handler};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/{page}", get(page_handler))
        .with_state(state)
}
