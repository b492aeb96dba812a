//! Request routing and dispatch.
//!
//! # Responsibilities
//! - Split each path at the `/ui` marker
//! - Marker present: fetch the resource's handler set, dispatch the sub-route
//! - Marker absent: list directories, redirect plain files to their view root
//!
//! # Design Decisions
//! - Stateless per request; the cache is the only shared state
//! - Sub-route lookup is exact after normalization, never prefix-based
//! - Traversal outside the root is reported as not found
//! - Special files (FIFOs, sockets, devices) are not served

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::cache::handler_cache::is_missing;
use crate::cache::{CacheError, HandlerCache};
use crate::listing::{read_listing, render_listing, ListingParams, SortOrder};
use crate::routing::path::{normalize_sub_route, resolve_under_root, split_marker, PathError, MARKER};

/// Why a request could not be served.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No resource, or no view with that sub-route.
    #[error("Not found")]
    NotFound,

    /// The request path could not be mapped under the root.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The handler cache failed to produce a handler set.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Stat of the requested path failed for a reason other than absence.
    #[error("Failed to stat {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    /// Reading a directory for its listing failed.
    #[error("Failed to list {}: {source}", path.display())]
    Listing { path: PathBuf, source: io::Error },
}

impl RouteError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::NotFound | RouteError::Path(_) => StatusCode::NOT_FOUND,
            RouteError::Cache(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            RouteError::Cache(_) | RouteError::Stat { .. } | RouteError::Listing { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Maps request paths onto cached views, listings and redirects.
#[derive(Debug)]
pub struct RequestRouter {
    root: PathBuf,
    cache: Arc<HandlerCache>,
}

impl RequestRouter {
    /// `root` should be canonical so cache keys are stable.
    pub fn new(root: impl Into<PathBuf>, cache: Arc<HandlerCache>) -> Self {
        Self {
            root: root.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<HandlerCache> {
        &self.cache
    }

    /// Produce the response for one request.
    pub async fn route(&self, request: Request<Body>) -> Response {
        let path = request.uri().path().to_owned();

        let result = match split_marker(&path) {
            Some((resource, sub_route)) => self.serve_view(resource, sub_route, request).await,
            None => {
                let sort = Query::<ListingParams>::try_from_uri(request.uri())
                    .map(|Query(params)| params.sort)
                    .unwrap_or_default();
                self.serve_path(&path, SortOrder::from_query(sort.as_deref()))
                    .await
            }
        };

        result.unwrap_or_else(|e| {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(path = %path, error = %e, "Request failed");
            } else {
                tracing::debug!(path = %path, error = %e, "Request not served");
            }
            e.into_response()
        })
    }

    async fn serve_view(
        &self,
        resource: &str,
        sub_route: &str,
        request: Request<Body>,
    ) -> Result<Response, RouteError> {
        let key = resolve_under_root(&self.root, resource)?;
        let handlers = self.cache.get(&key).await?;

        let route = normalize_sub_route(sub_route);
        let handler = handlers.get(&route).ok_or(RouteError::NotFound)?;
        tracing::debug!(resource = %key.display(), route = %route, "Dispatching view");
        Ok(handler.serve(&request))
    }

    async fn serve_path(&self, path: &str, order: SortOrder) -> Result<Response, RouteError> {
        let target = resolve_under_root(&self.root, path)?;
        let metadata = match tokio::fs::metadata(&target).await {
            Ok(m) => m,
            Err(e) if is_missing(&e) => return Err(RouteError::NotFound),
            Err(source) => return Err(RouteError::Stat { path: target, source }),
        };

        if metadata.is_dir() {
            let entries = read_listing(&target, order)
                .await
                .map_err(|source| RouteError::Listing {
                    path: target.clone(),
                    source,
                })?;
            return Ok(Html(render_listing(path, &entries)).into_response());
        }

        if metadata.is_file() {
            // Build eagerly so a broken file fails here instead of at the view root.
            self.cache.get(&target).await?;
            let location = format!("{}{}/", path.trim_end_matches('/'), MARKER);
            return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
        }

        Err(RouteError::NotFound)
    }
}
