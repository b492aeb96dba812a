//! Response helpers.
//!
//! # Responsibilities
//! - Map routing errors to status codes and client-facing bodies
//! - Escape text interpolated into generated HTML
//!
//! # Design Decisions
//! - 500 bodies are generic; the detailed error goes to the log only
//! - 404 covers missing resources, unknown views and traversal attempts alike

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routing::RouteError;

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::NOT_FOUND => "404 page not found",
            _ => "Internal server error",
        };
        (status, body).into_response()
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for use in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use std::path::PathBuf;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("plain.prof"), "plain.prof");
    }

    #[test]
    fn test_route_error_status() {
        assert_eq!(RouteError::NotFound.into_response().status(), StatusCode::NOT_FOUND);

        let missing = RouteError::Cache(CacheError::NotFound(PathBuf::from("/r/a.prof")));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let aborted = RouteError::Cache(CacheError::BuildAborted {
            path: PathBuf::from("/r/a.prof"),
            reason: "panicked".into(),
        });
        assert_eq!(aborted.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
