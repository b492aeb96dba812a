//! Request path parsing.
//!
//! # Responsibilities
//! - Split request paths at the `/ui` marker segment
//! - Normalize sub-routes before handler lookup
//! - Resolve request paths to filesystem paths under the served root
//!
//! # Design Decisions
//! - The marker matches a whole segment only (`/ui` followed by `/` or end)
//! - First occurrence wins
//! - `..` anywhere in the decoded path is rejected, never clamped

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Segment separating resource selection from view selection.
pub const MARKER: &str = "/ui";

/// Errors produced while mapping a request path onto the filesystem.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// The path tried to leave the served root.
    #[error("Path escapes the served root")]
    Traversal,

    /// Percent-decoding did not yield UTF-8.
    #[error("Path is not valid UTF-8 after decoding")]
    InvalidEncoding,
}

/// Split `path` at the first `/ui` segment.
///
/// Returns `(resource, sub_route)` where `sub_route` is everything after the
/// marker, possibly empty. Returns `None` when no segment is exactly `ui`.
pub fn split_marker(path: &str) -> Option<(&str, &str)> {
    let mut search_from = 0;
    while let Some(offset) = path[search_from..].find(MARKER) {
        let start = search_from + offset;
        let end = start + MARKER.len();
        let rest = &path[end..];
        if rest.is_empty() || rest.starts_with('/') {
            return Some((&path[..start], rest));
        }
        search_from = end;
    }
    None
}

/// Normalize a sub-route for exact lookup.
///
/// Empty input becomes `/`, runs of slashes collapse, and a trailing slash is
/// dropped unless the route is the root itself.
pub fn normalize_sub_route(route: &str) -> String {
    let mut normalized = String::with_capacity(route.len() + 1);
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Map a raw (percent-encoded) request path onto a path under `root`.
pub fn resolve_under_root(root: &Path, request_path: &str) -> Result<PathBuf, PathError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding)?;

    let mut resolved = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::Traversal),
            s if s.contains('\\') || s.contains('\0') => return Err(PathError::Traversal),
            s => resolved.push(s),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_marker() {
        assert_eq!(
            split_marker("/report.prof/ui/graph"),
            Some(("/report.prof", "/graph"))
        );
        assert_eq!(split_marker("/report.prof/ui"), Some(("/report.prof", "")));
        assert_eq!(split_marker("/report.prof/ui/"), Some(("/report.prof", "/")));
        assert_eq!(split_marker("/a/b.prof/ui/x/ui/y"), Some(("/a/b.prof", "/x/ui/y")));
        assert_eq!(split_marker("/report.prof"), None);
    }

    #[test]
    fn test_marker_must_be_whole_segment() {
        assert_eq!(split_marker("/uix.prof"), None);
        assert_eq!(split_marker("/dir/uiconfig/ui/top"), Some(("/dir/uiconfig", "/top")));
        assert_eq!(split_marker("/guide/ui"), Some(("/guide", "")));
    }

    #[test]
    fn test_normalize_sub_route() {
        assert_eq!(normalize_sub_route(""), "/");
        assert_eq!(normalize_sub_route("/"), "/");
        assert_eq!(normalize_sub_route("//"), "/");
        assert_eq!(normalize_sub_route("/graph"), "/graph");
        assert_eq!(normalize_sub_route("//graph/"), "/graph");
        assert_eq!(normalize_sub_route("/source//list/"), "/source/list");
        assert_eq!(normalize_sub_route("top"), "/top");
    }

    #[test]
    fn test_resolve_under_root() {
        let root = Path::new("/srv/profiles");
        assert_eq!(
            resolve_under_root(root, "/a/b.prof").unwrap(),
            PathBuf::from("/srv/profiles/a/b.prof")
        );
        assert_eq!(
            resolve_under_root(root, "/a//./b.prof/").unwrap(),
            PathBuf::from("/srv/profiles/a/b.prof")
        );
        assert_eq!(resolve_under_root(root, "/").unwrap(), PathBuf::from("/srv/profiles"));
        assert_eq!(
            resolve_under_root(root, "/my%20file.prof").unwrap(),
            PathBuf::from("/srv/profiles/my file.prof")
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/profiles");
        assert_eq!(resolve_under_root(root, "/../etc/passwd"), Err(PathError::Traversal));
        assert_eq!(resolve_under_root(root, "/a/../../x"), Err(PathError::Traversal));
        assert_eq!(resolve_under_root(root, "/%2e%2e/etc"), Err(PathError::Traversal));
        assert_eq!(resolve_under_root(root, "/a%2f..%2fb"), Err(PathError::Traversal));
        assert_eq!(resolve_under_root(root, "/%ff"), Err(PathError::InvalidEncoding));
    }
}
