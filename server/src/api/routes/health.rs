//! Health check endpoint

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use serde::Serialize;
use utoipa::ToSchema;

use super::ListingState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    /// `ok` or `unavailable`
    pub database: &'static str,
}

pub fn routes(state: ListingState) -> Router<()> {
    Router::new()
        .route("/api/v1/health", get(health))
        .with_state(state)
}

/// Liveness plus a database round-trip
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<ListingState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database, code) = match state.executor.store().ping().await {
        Ok(()) => ("ok", "ok", StatusCode::OK),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            ("degraded", "unavailable", StatusCode::SERVICE_UNAVAILABLE)
        }
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
