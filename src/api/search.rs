use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{SearchFailure, SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /api/search - Embed the query and return the index's top-K matches.
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<SearchFailure>)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Query is required"));
    }
    tracing::info!("Query received: {query}");

    match state.search.search(&query).await {
        Ok(results) => Ok(Json(SearchResponse {
            success: true,
            results,
        })),
        Err(e) => {
            tracing::error!("Search failed: {e:#}");
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}")))
        }
    }
}

fn failure(status: StatusCode, details: &str) -> (StatusCode, Json<SearchFailure>) {
    (
        status,
        Json(SearchFailure {
            success: false,
            error: "Failed request".to_string(),
            details: details.to_string(),
        }),
    )
}
