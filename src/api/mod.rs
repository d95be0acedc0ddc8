//! Axum handlers and the application router.

pub mod chat;
pub mod pages;
pub mod recent;
pub mod search;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // No CORS layer: the pages are served from the same origin.
    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/chat", get(pages::chat))
        .route("/about", get(pages::about))
        .route("/pricing", get(pages::pricing))
        .route("/contact", get(pages::contact))
        // Proxies
        .route("/api/search", post(search::search))
        .route("/api/chat", post(chat::chat))
        // Results sessions
        .route("/api/sessions", post(sessions::start_session))
        .route("/api/sessions/{id}", get(sessions::get_session))
        .route("/api/sessions/{id}/refine", post(sessions::refine_session))
        .route(
            "/api/sessions/{id}/selection",
            post(sessions::toggle_selection).delete(sessions::clear_selection),
        )
        .route("/api/sessions/{id}/report", post(sessions::generate_report))
        // Previous queries
        .route(
            "/api/recent",
            get(recent::list_recent).delete(recent::clear_recent),
        )
        .with_state(state)
        .fallback(get(pages::index))
}
