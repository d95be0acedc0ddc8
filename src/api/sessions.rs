use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RefineRequest, SearchResult, SelectionRequest, StartSessionRequest};
use crate::pipeline::{PipelineError, Session, SessionHandle};
use crate::report::{self, ReportFormat};
use crate::state::AppState;

const MAX_QUERY_LEN: usize = 2_000;

/// POST /api/sessions - Open a results session and start the pipeline for its
/// query in the background. Poll GET /api/sessions/:id for progress.
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<Session>), (StatusCode, String)> {
    let query = validate_text(&req.query, "Query")?;

    state.recent.record(&query);
    let handle = state.sessions.insert(Session::new(query));
    let id = handle.read().id;

    state
        .pipeline
        .spawn_start(&handle)
        .map_err(|e| pipeline_error(e, "process search"))?;
    tracing::info!("Session {id} started");

    let view = handle.read().clone();
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id - Current transcript, results and selection.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let handle = find(&state, &id)?;
    let session = handle.read().clone();
    Ok(Json(session))
}

/// POST /api/sessions/:id/refine - Re-run the pipeline with extra context.
pub async fn refine_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RefineRequest>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let refinement = validate_text(&req.refinement, "Refinement")?;
    let handle = find(&state, &id)?;

    state
        .pipeline
        .refine(&handle, &refinement)
        .await
        .map_err(|e| pipeline_error(e, "process refinement"))?;

    let session = handle.read().clone();
    Ok(Json(session))
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub title: String,
    pub selected: bool,
    pub selection: Vec<SearchResult>,
}

/// POST /api/sessions/:id/selection - Toggle one result in or out of the selection.
pub async fn toggle_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, (StatusCode, String)> {
    let handle = find(&state, &id)?;
    let mut session = handle.write();

    // Previously selected items may have scrolled out of the current results
    let result = session
        .find_result(&req.title)
        .or_else(|| session.selected.iter().find(|r| r.title == req.title))
        .cloned()
        .ok_or((StatusCode::NOT_FOUND, "Result not found".to_string()))?;

    let selected = session.toggle_selection(&result);
    Ok(Json(SelectionResponse {
        title: result.title,
        selected,
        selection: session.selected.clone(),
    }))
}

/// DELETE /api/sessions/:id/selection - Clear the selection.
pub async fn clear_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let handle = find(&state, &id)?;
    handle.write().clear_selection();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub format: ReportFormat,
}

/// POST /api/sessions/:id/report - Summarize the selection into a PDF or HTML download.
pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReportParams>,
) -> Result<Response, (StatusCode, String)> {
    let handle = find(&state, &id)?;
    let (query, selected) = {
        let session = handle.read();
        (session.query.clone(), session.selected.clone())
    };
    if selected.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Select at least one result first".to_string(),
        ));
    }

    let report = report::build_report(state.chat.as_ref(), &query, &selected)
        .await
        .map_err(|e| {
            tracing::error!("Report generation failed for session {id}: {e:#}");
            report_failed()
        })?;
    let file_name = report.file_name(params.format);

    let (content_type, body) = match params.format {
        ReportFormat::Html => (
            "text/html; charset=utf-8",
            report::html::render_html(&report).into_bytes(),
        ),
        ReportFormat::Pdf => {
            let bytes = tokio::task::spawn_blocking(move || report::pdf::render_pdf(&report))
                .await
                .map_err(|e| {
                    tracing::error!("PDF render task failed: {e}");
                    report_failed()
                })?
                .map_err(|e| {
                    tracing::error!("PDF render failed: {e:#}");
                    report_failed()
                })?;
            ("application/pdf", bytes)
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

// ─── Helpers ─────────────────────────────────────────────

fn find(state: &AppState, id: &Uuid) -> Result<SessionHandle, (StatusCode, String)> {
    state
        .sessions
        .get(id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found".to_string()))
}

fn validate_text(text: &str, what: &str) -> Result<String, (StatusCode, String)> {
    let text = text.trim();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{what} is required")));
    }
    if text.len() > MAX_QUERY_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{what} exceeds {MAX_QUERY_LEN} bytes"),
        ));
    }
    Ok(text.to_string())
}

fn pipeline_error(e: PipelineError, action: &str) -> (StatusCode, String) {
    match e {
        PipelineError::Busy => (StatusCode::CONFLICT, e.to_string()),
        // Already logged by the pipeline
        PipelineError::Failed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {action}. Please try again."),
        ),
    }
}

fn report_failed() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to generate report. Please try again.".to_string(),
    )
}
