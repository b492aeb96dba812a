//! View handlers and handler sets.
//!
//! A renderer turns one file into a [`HandlerSet`]: a map from sub-route to a
//! [`ViewHandler`]. The router only ever sees this capability, never the
//! renderer's internals.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::routing::path::normalize_sub_route;

/// Anything that can answer an HTTP request for one view of a resource.
pub trait ViewHandler: Send + Sync {
    /// Produce the response for `request`.
    fn serve(&self, request: &Request<Body>) -> Response;
}

/// Views built for one resource, keyed by normalized sub-route.
#[derive(Clone, Default)]
pub struct HandlerSet {
    views: HashMap<String, Arc<dyn ViewHandler>>,
}

impl HandlerSet {
    /// Create an empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `route`, replacing any previous handler.
    pub fn insert(&mut self, route: &str, handler: Arc<dyn ViewHandler>) {
        self.views.insert(normalize_sub_route(route), handler);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, route: &str, handler: impl ViewHandler + 'static) -> Self {
        self.insert(route, Arc::new(handler));
        self
    }

    /// Exact lookup of an already normalized sub-route.
    pub fn get(&self, route: &str) -> Option<&Arc<dyn ViewHandler>> {
        self.views.get(route)
    }

    /// All registered routes, sorted.
    pub fn routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.views.keys().map(String::as_str).collect();
        routes.sort_unstable();
        routes
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("routes", &self.routes())
            .finish()
    }
}
