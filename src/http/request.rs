//! Request handling and transformation.
//!
//! # Responsibilities
//! - Name the request ID header shared by the ID and propagation layers
//! - Normalize request paths so routing honours `caseSensitive` and
//!   `strictRouting`
//!
//! # Design Decisions
//! - Normalization runs before routing; registered paths go through the same
//!   function so both sides always agree
//! - The query string is carried over untouched

use axum::http::{Request, Uri};

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Canonical form of `path` under the given routing rules.
///
/// Without strict routing a trailing slash is dropped (`/health/` matches
/// `/health`). Without case sensitivity the path is lowercased.
pub fn normalize_path(path: &str, case_sensitive: bool, strict_routing: bool) -> String {
    let mut normalized = if !strict_routing && path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    };
    if normalized.is_empty() {
        normalized.push('/');
    }
    if !case_sensitive {
        normalized.make_ascii_lowercase();
    }
    normalized
}

/// Rewrite the request URI path in place. Requests whose path is already
/// canonical pass through untouched.
pub fn normalize_request<B>(
    mut request: Request<B>,
    case_sensitive: bool,
    strict_routing: bool,
) -> Request<B> {
    let path = request.uri().path();
    let normalized = normalize_path(path, case_sensitive, strict_routing);
    if normalized == path {
        return request;
    }

    let path_and_query = match request.uri().query() {
        Some(query) => format!("{normalized}?{query}"),
        None => normalized,
    };

    let mut parts = request.uri().clone().into_parts();
    match path_and_query.parse() {
        Ok(pq) => {
            parts.path_and_query = Some(pq);
            if let Ok(uri) = Uri::from_parts(parts) {
                *request.uri_mut() = uri;
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %path_and_query, "Path left unnormalized");
        }
    }
    request
}
