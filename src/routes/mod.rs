pub mod error;
pub mod health;
pub mod metrics;
pub mod session;

use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// Largest accepted request body (10 MB). Portraits arrive base64-encoded, so
/// the raw image limit is about three quarters of this.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Page and API routes. The Prometheus endpoint is attached by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/session",
            post(session::select_image)
                .get(session::get_session)
                .delete(session::reset),
        )
        .route("/api/v1/session/upload", post(session::upload_image))
        .route("/api/v1/session/rerun", post(session::rerun))
        .route(
            "/api/v1/session/items/{id}/image",
            get(session::download_image),
        )
        // Json and Multipart extractors otherwise stop at axum's 2 MB default
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
