//! Liveness probe.

use axum::http::StatusCode;

/// `GET /health`: returns 200 with the text "OK" while the server is up.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
