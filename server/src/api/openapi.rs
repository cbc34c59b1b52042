//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::listing::Links;
use crate::api::routes::{health, posts, products};
use crate::query::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Catalog and feed listings with filtering, sorting and cursor pagination"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "products", description = "Product catalog"),
        (name = "posts", description = "Social feed")
    ),
    paths(
        health::health,
        products::list_products,
        posts::list_posts,
        posts::list_my_posts,
    ),
    components(schemas(health::HealthResponse, Links, PaginationMeta))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_list_endpoint() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in ["/api/v1/health", "/api/v1/products", "/api/v1/posts", "/api/v1/me/posts"] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
        assert!(doc["components"]["schemas"]["PaginationMeta"].is_object());
    }
}
