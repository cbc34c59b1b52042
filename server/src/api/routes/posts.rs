//! Feed API endpoints

use axum::Router;
use axum::extract::State;
use axum::routing::get;

use super::ListingState;
use crate::api::extractors::{ListRequest, ViewerId};
use crate::api::listing::ListResponse;
use crate::api::types::ApiError;
use crate::query::{Filter, Scalar};

/// Build feed routes
pub fn routes(state: ListingState) -> Router<()> {
    Router::new()
        .route("/api/v1/posts", get(list_posts))
        .route("/api/v1/me/posts", get(list_my_posts))
        .with_state(state)
}

/// List public posts, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "posts",
    params(
        ("filter[field][op]" = Option<String>, Query, description = "Filter, e.g. filter[author_id]=user-1"),
        ("sort" = Option<String>, Query, description = "Comma-separated field:dir (default created_at:desc)"),
        ("fields" = Option<String>, Query, description = "Comma-separated fields to return, or *"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("cursor" = Option<String>, Query, description = "Continuation cursor"),
        ("page" = Option<u32>, Query, description = "Page number (offset mode)"),
        ("offset" = Option<u64>, Query, description = "Row offset (offset mode)")
    ),
    responses(
        (status = 200, description = "Page of public posts"),
        (status = 400, description = "Invalid query parameters"),
        (status = 410, description = "Cursor expired")
    )
)]
pub async fn list_posts(
    State(state): State<ListingState>,
    request: ListRequest,
) -> Result<ListResponse, ApiError> {
    let base = [Filter::eq("visibility", Scalar::Text("public".to_string()))];
    let page = state
        .resources
        .posts
        .list(&state.executor, &request.params, &base)
        .await?;
    Ok(ListResponse::new(page, &request))
}

/// List the caller's own posts, any visibility
#[utoipa::path(
    get,
    path = "/api/v1/me/posts",
    tag = "posts",
    params(
        ("x-user-id" = String, Header, description = "Caller id set by the gateway"),
        ("filter[field][op]" = Option<String>, Query, description = "Filter, e.g. filter[visibility]=private"),
        ("sort" = Option<String>, Query, description = "Comma-separated field:dir (default created_at:desc)"),
        ("fields" = Option<String>, Query, description = "Comma-separated fields to return, or *"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("cursor" = Option<String>, Query, description = "Continuation cursor"),
        ("page" = Option<u32>, Query, description = "Page number (offset mode)"),
        ("offset" = Option<u64>, Query, description = "Row offset (offset mode)")
    ),
    responses(
        (status = 200, description = "Page of the caller's posts with total"),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Missing or invalid x-user-id"),
        (status = 410, description = "Cursor expired")
    )
)]
pub async fn list_my_posts(
    State(state): State<ListingState>,
    ViewerId(viewer): ViewerId,
    request: ListRequest,
) -> Result<ListResponse, ApiError> {
    let base = [Filter::eq("author_id", Scalar::Text(viewer))];
    let page = state
        .resources
        .my_posts
        .list(&state.executor, &request.params, &base)
        .await?;
    Ok(ListResponse::new(page, &request))
}
