//! Catalog API endpoints

use axum::Router;
use axum::extract::State;
use axum::routing::get;

use super::ListingState;
use crate::api::extractors::ListRequest;
use crate::api::listing::ListResponse;
use crate::api::types::ApiError;
use crate::query::{Filter, Scalar};

/// Build catalog routes
pub fn routes(state: ListingState) -> Router<()> {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .with_state(state)
}

/// List active products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "products",
    params(
        ("filter[field][op]" = Option<String>, Query, description = "Filter, e.g. filter[price][gte]=5.99 or filter[category]=books"),
        ("sort" = Option<String>, Query, description = "Comma-separated field:dir, e.g. price:asc (default created_at:desc)"),
        ("fields" = Option<String>, Query, description = "Comma-separated fields to return, or *"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("cursor" = Option<String>, Query, description = "Continuation cursor from links.next or links.prev"),
        ("page" = Option<u32>, Query, description = "Page number (offset mode)"),
        ("offset" = Option<u64>, Query, description = "Row offset (offset mode)")
    ),
    responses(
        (status = 200, description = "Page of products with links and pagination metadata"),
        (status = 400, description = "Invalid filter, sort, field, limit or cursor"),
        (status = 410, description = "Cursor expired; restart from the first page")
    )
)]
pub async fn list_products(
    State(state): State<ListingState>,
    request: ListRequest,
) -> Result<ListResponse, ApiError> {
    let base = [Filter::eq("is_active", Scalar::Boolean(true))];
    let page = state
        .resources
        .products
        .list(&state.executor, &request.params, &base)
        .await?;
    Ok(ListResponse::new(page, &request))
}
