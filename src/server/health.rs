//! Liveness check.

use axum::http::StatusCode;

/// `GET /health`: 200 with body `OK` while the server is accepting requests.
///
/// Does not touch the store or Saleor, so it stays green when either is down.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
