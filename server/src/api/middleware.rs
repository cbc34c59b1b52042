//! HTTP middleware (404 handler)

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::types::ApiError;

/// Handle 404 Not Found with logging
pub async fn handle_404(req: Request) -> impl IntoResponse {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let user_agent = req
            .headers()
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::debug!(
            status = StatusCode::NOT_FOUND.as_u16(),
            method = %req.method(),
            uri = %req.uri(),
            user_agent,
            "[404] No route"
        );
    }
    ApiError::not_found("NOT_FOUND", format!("No route for {}", req.uri().path()))
}
