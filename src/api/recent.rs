use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::state::AppState;

/// GET /api/recent - Previous queries, most recent first.
pub async fn list_recent(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.recent.list())
}

/// DELETE /api/recent - Forget all previous queries.
pub async fn clear_recent(State(state): State<AppState>) -> StatusCode {
    state.recent.clear();
    StatusCode::NO_CONTENT
}
