use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "pages": state.pages.len(),
        "generated_at": state.generated_at.to_rfc3339(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
