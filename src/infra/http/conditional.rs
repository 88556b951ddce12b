//! Shared-cache headers and ETag validation for rendered pages.

use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
    },
    response::{Html, IntoResponse, Response},
};
use sha2::{Digest, Sha256};

/// `Cache-Control` for content any proxy may store for `ttl_secs`, then revalidate.
pub fn shared_cache_control(ttl_secs: u64) -> String {
    format!("public, must-revalidate, s-maxage={ttl_secs}")
}

/// Strong, quoted entity tag derived from the rendered body.
pub fn etag_for(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&digest[..]))
}

/// True when an `If-None-Match` header lists `etag` (weak comparison) or `*`.
pub fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
}

/// Build the HTML response for `body` with shared-cache headers, answering
/// `304 Not Modified` when the client already holds the same representation.
pub fn cacheable_html(request_headers: &HeaderMap, body: String, ttl_secs: u64) -> Response {
    let etag = etag_for(body.as_bytes());
    let cache_control = shared_cache_control(ttl_secs);

    let mut response = if if_none_match_matches(request_headers, &etag) {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        response
    } else {
        Html(body).into_response()
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(ETAG, value);
    }

    response
}
