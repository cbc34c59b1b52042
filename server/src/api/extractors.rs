//! Request extractors for list endpoints
//!
//! `ListRequest` turns the raw query string into `QueryParams` while keeping
//! the original text for link building. `ViewerId` reads the caller id the
//! gateway forwards.

use axum::extract::{FromRequestParts, OriginalUri, Query};
use axum::http::request::Parts;

use super::types::ApiError;
use crate::core::constants::{HEADER_USER_ID, USER_ID_MAX_LEN};
use crate::query::QueryParams;

/// Parsed list-query parameters plus the request target they came from
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub params: QueryParams,
    /// Request path without the query string
    pub path: String,
    /// Query string exactly as received, without the leading `?`
    pub raw_query: Option<String>,
}

impl<S> FromRequestParts<S> for ListRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers strip their prefix from `parts.uri`
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());

        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri)
            .map_err(|e| ApiError::bad_request("INVALID_QUERY", e.body_text()))?;
        let params = QueryParams::from_pairs(pairs)?;

        Ok(Self {
            params,
            path: uri.path().to_string(),
            raw_query: uri.query().map(str::to_string),
        })
    }
}

/// Validate viewer id: 1-64 chars, alphanumeric + dash/underscore
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= USER_ID_MAX_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Authenticated caller, identified by the `x-user-id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerId(pub String);

impl<S> FromRequestParts<S> for ViewerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(HEADER_USER_ID)
            .ok_or_else(|| ApiError::unauthorized("MISSING_USER_ID", "Authentication required"))?;
        let id = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("INVALID_USER_ID", "Invalid user id header"))?;
        if !is_valid_user_id(id) {
            return Err(ApiError::unauthorized(
                "INVALID_USER_ID",
                "Invalid user id header",
            ));
        }
        Ok(Self(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn list_request(uri: &str) -> Result<ListRequest, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ListRequest::from_request_parts(&mut parts, &()).await
    }

    async fn viewer(header: Option<&str>) -> Result<ViewerId, ApiError> {
        let mut builder = Request::builder().uri("/api/v1/me/posts");
        if let Some(value) = header {
            builder = builder.header(HEADER_USER_ID, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ViewerId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn list_request_decodes_pairs() {
        let request =
            list_request("/api/v1/products?filter%5Bprice%5D%5Bgte%5D=5.99&sort=price:asc&limit=2")
                .await
                .unwrap();
        assert_eq!(request.path, "/api/v1/products");
        assert_eq!(request.params.filters.len(), 1);
        assert_eq!(request.params.filters[0].field, "price");
        assert_eq!(request.params.filters[0].operator.as_deref(), Some("gte"));
        assert_eq!(request.params.filters[0].value, "5.99");
        assert_eq!(request.params.sort.as_deref(), Some("price:asc"));
        assert_eq!(request.params.pagination.limit.as_deref(), Some("2"));
        assert!(request.raw_query.unwrap().starts_with("filter%5B"));
    }

    #[tokio::test]
    async fn list_request_rejects_malformed_filter_key() {
        let err = list_request("/api/v1/products?filter%5Bprice=1").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { ref code, .. } if code == "MALFORMED_FILTER"));
    }

    #[tokio::test]
    async fn viewer_header_validation() {
        assert_eq!(viewer(Some("user-1")).await.unwrap(), ViewerId("user-1".into()));
        assert!(matches!(
            viewer(None).await,
            Err(ApiError::Unauthorized { ref code, .. }) if code == "MISSING_USER_ID"
        ));
        assert!(viewer(Some("")).await.is_err());
        assert!(viewer(Some("a b")).await.is_err());
        assert!(viewer(Some(&"x".repeat(65))).await.is_err());
    }
}
