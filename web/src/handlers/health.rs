//! Liveness, readiness and metrics endpoints.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// `GET /health`. Does not touch any dependency.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") }),
    )
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness
    pub ready: bool,
    /// Database answered `SELECT 1` (`true` when no database is configured)
    pub database: bool,
}

/// `GET /ready`. 503 when the database does not answer.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match &state.pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(error = %error, "Readiness check failed");
                false
            }
        },
        None => true,
    };

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessResponse { ready: database, database }))
}

/// `GET /metrics` in Prometheus text format. 404 when no recorder is installed.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(exporter) => (StatusCode::OK, exporter.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
