//! List response envelope and pagination headers
//!
//! Renders a `Page` as `{ data, links, meta: { pagination, query } }` and
//! mirrors navigation in an RFC 8288 `Link` header. Offset pages also carry
//! `X-Total-Count`, `X-Per-Page`, `X-Page` and `Content-Range`.

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use super::extractors::ListRequest;
use crate::query::{Page, PaginationMeta, QuerySummary};

const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");
const X_PER_PAGE: HeaderName = HeaderName::from_static("x-per-page");
const X_PAGE: HeaderName = HeaderName::from_static("x-page");

/// Parameters that select a position and are replaced in navigation links
const POSITION_PARAMS: &[&str] = &["cursor", "page", "offset"];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub pagination: PaginationMeta,
    pub query: QuerySummary,
}

#[derive(Debug, Serialize)]
pub struct ListEnvelope {
    pub data: Vec<serde_json::Value>,
    pub links: Links,
    pub meta: ListMeta,
}

/// A rendered list page
pub struct ListResponse {
    envelope: ListEnvelope,
    headers: HeaderMap,
}

impl ListResponse {
    pub fn new(page: Page, request: &ListRequest) -> Self {
        let links = build_links(&page.meta, request);
        let headers = build_headers(&page.meta, &links);
        let data = page.data();
        Self {
            envelope: ListEnvelope {
                data,
                links,
                meta: ListMeta {
                    pagination: page.meta,
                    query: page.query,
                },
            },
            headers,
        }
    }
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        (self.headers, Json(self.envelope)).into_response()
    }
}

/// Query string with position parameters removed, in original encoding
fn base_query(raw_query: Option<&str>) -> Vec<&str> {
    raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|part| !part.is_empty())
        .filter(|part| {
            let key = part.split('=').next().unwrap_or_default();
            !POSITION_PARAMS.contains(&key)
        })
        .collect()
}

fn link_to(request: &ListRequest, position: (&str, String)) -> String {
    let mut parts: Vec<String> = base_query(request.raw_query.as_deref())
        .into_iter()
        .map(str::to_string)
        .collect();
    parts.push(format!("{}={}", position.0, position.1));
    format!("{}?{}", request.path, parts.join("&"))
}

fn build_links(meta: &PaginationMeta, request: &ListRequest) -> Links {
    let self_link = match request.raw_query.as_deref() {
        Some(query) if !query.is_empty() => format!("{}?{}", request.path, query),
        _ => request.path.clone(),
    };

    let (next, prev) = if meta.mode == "offset" {
        let offset = meta.offset.unwrap_or_default();
        let limit = u64::from(meta.limit);
        match meta.page {
            Some(page) => (
                meta.has_more
                    .then(|| link_to(request, ("page", (page + 1).to_string()))),
                (page > 1).then(|| link_to(request, ("page", (page - 1).to_string()))),
            ),
            None => (
                meta.has_more
                    .then(|| link_to(request, ("offset", (offset + limit).to_string()))),
                (offset > 0).then(|| {
                    link_to(request, ("offset", offset.saturating_sub(limit).to_string()))
                }),
            ),
        }
    } else {
        (
            meta.next_cursor
                .clone()
                .map(|c| link_to(request, ("cursor", c))),
            meta.prev_cursor
                .clone()
                .map(|c| link_to(request, ("cursor", c))),
        )
    };

    Links {
        self_link,
        next,
        prev,
    }
}

fn build_headers(meta: &PaginationMeta, links: &Links) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let link_header = [(&links.next, "next"), (&links.prev, "prev")]
        .into_iter()
        .filter_map(|(target, rel)| {
            target
                .as_ref()
                .map(|url| format!("<{}>; rel=\"{}\"", url, rel))
        })
        .collect::<Vec<_>>()
        .join(", ");
    insert(&mut headers, header::LINK, link_header);

    if meta.mode == "offset" {
        let offset = meta.offset.unwrap_or_default();
        let limit = u64::from(meta.limit);
        insert(&mut headers, X_PER_PAGE, meta.limit.to_string());
        insert(
            &mut headers,
            X_PAGE,
            meta.page
                .map(u64::from)
                .unwrap_or(offset / limit.max(1) + 1)
                .to_string(),
        );

        let total = meta
            .total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "*".to_string());
        if let Some(t) = meta.total {
            insert(&mut headers, X_TOTAL_COUNT, t.to_string());
        }
        let range = if meta.count == 0 {
            format!("items */{}", total)
        } else {
            format!(
                "items {}-{}/{}",
                offset,
                offset + meta.count as u64 - 1,
                total
            )
        };
        insert(&mut headers, header::CONTENT_RANGE, range);
    }

    headers
}

/// Insert a header, skipping empty or unrepresentable values
fn insert(headers: &mut HeaderMap, name: HeaderName, value: String) {
    if value.is_empty() {
        return;
    }
    match HeaderValue::from_str(&value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "Skipping invalid response header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParams;

    fn request(raw: Option<&str>) -> ListRequest {
        ListRequest {
            params: QueryParams::default(),
            path: "/api/v1/products".into(),
            raw_query: raw.map(str::to_string),
        }
    }

    fn cursor_meta(next: Option<&str>, prev: Option<&str>) -> PaginationMeta {
        PaginationMeta {
            mode: "cursor".into(),
            has_more: next.is_some(),
            limit: 2,
            count: 2,
            next_cursor: next.map(str::to_string),
            prev_cursor: prev.map(str::to_string),
            total: None,
            page: None,
            offset: None,
        }
    }

    fn offset_meta(page: Option<u32>, offset: u64, count: usize, has_more: bool) -> PaginationMeta {
        PaginationMeta {
            mode: "offset".into(),
            has_more,
            limit: 10,
            count,
            next_cursor: None,
            prev_cursor: None,
            total: Some(25),
            page,
            offset: Some(offset),
        }
    }

    #[test]
    fn cursor_links_replace_the_cursor_param() {
        let req = request(Some("sort=price:asc&cursor=old&limit=2"));
        let links = build_links(&cursor_meta(Some("NEXT"), Some("PREV")), &req);
        assert_eq!(links.self_link, "/api/v1/products?sort=price:asc&cursor=old&limit=2");
        assert_eq!(
            links.next.as_deref(),
            Some("/api/v1/products?sort=price:asc&limit=2&cursor=NEXT")
        );
        assert_eq!(
            links.prev.as_deref(),
            Some("/api/v1/products?sort=price:asc&limit=2&cursor=PREV")
        );

        let headers = build_headers(&cursor_meta(Some("NEXT"), Some("PREV")), &links);
        assert_eq!(
            headers[header::LINK],
            "</api/v1/products?sort=price:asc&limit=2&cursor=NEXT>; rel=\"next\", \
             </api/v1/products?sort=price:asc&limit=2&cursor=PREV>; rel=\"prev\""
        );
        assert!(headers.get(X_TOTAL_COUNT).is_none());
    }

    #[test]
    fn last_cursor_page_has_no_link_header() {
        let req = request(None);
        let links = build_links(&cursor_meta(None, None), &req);
        assert_eq!(links.self_link, "/api/v1/products");
        assert!(links.next.is_none());
        assert!(build_headers(&cursor_meta(None, None), &links)
            .get(header::LINK)
            .is_none());
    }

    #[test]
    fn page_mode_headers() {
        let req = request(Some("page=2&limit=10"));
        let meta = offset_meta(Some(2), 10, 10, true);
        let links = build_links(&meta, &req);
        assert_eq!(links.next.as_deref(), Some("/api/v1/products?limit=10&page=3"));
        assert_eq!(links.prev.as_deref(), Some("/api/v1/products?limit=10&page=1"));

        let headers = build_headers(&meta, &links);
        assert_eq!(headers[X_TOTAL_COUNT], "25");
        assert_eq!(headers[X_PER_PAGE], "10");
        assert_eq!(headers[X_PAGE], "2");
        assert_eq!(headers[header::CONTENT_RANGE], "items 10-19/25");
    }

    #[test]
    fn offset_mode_links_and_empty_range() {
        let req = request(Some("offset=30"));
        let meta = offset_meta(None, 30, 0, false);
        let links = build_links(&meta, &req);
        assert!(links.next.is_none());
        assert_eq!(links.prev.as_deref(), Some("/api/v1/products?offset=20"));

        let headers = build_headers(&meta, &links);
        assert_eq!(headers[X_PAGE], "4");
        assert_eq!(headers[header::CONTENT_RANGE], "items */25");
    }
}
