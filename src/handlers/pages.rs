use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use crate::report::INDEX_PAGE;
use crate::state::AppState;

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, INDEX_PAGE)
}

pub async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
) -> Response {
    serve_page(&state, &page)
}

fn serve_page(state: &AppState, name: &str) -> Response {
    match state.page(name) {
        Some(html) => Html(html).into_response(),
        None => (StatusCode::NOT_FOUND, format!("No report named {name}")).into_response(),
    }
}
