//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all `GET` handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Own the handler cache and its background tasks
//! - Serve on a listener until the shutdown broadcast fires

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::{Evictor, FileWatcher, HandlerCache};
use crate::config::ServerConfig;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::renderer::Renderer;
use crate::routing::RequestRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
}

/// HTTP server for the profile browser.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    cache: Arc<HandlerCache>,
}

impl HttpServer {
    /// Create a server with an empty cache backed by `renderer`.
    ///
    /// The configured root is canonicalized so cache keys are stable.
    pub fn new(mut config: ServerConfig, renderer: Arc<dyn Renderer>) -> io::Result<Self> {
        config.root = config.root.canonicalize()?;

        let cache = Arc::new(HandlerCache::from_config(renderer, &config.cache));
        let state = AppState {
            router: Arc::new(RequestRouter::new(config.root.clone(), cache.clone())),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            cache,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(serve_request))
            .route("/{*path}", get(serve_request))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// The evictor (and the file watcher, if enabled) live exactly as long
    /// as this call.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.root.display(),
            "HTTP server starting"
        );

        let evictor = Evictor::new(
            self.cache.clone(),
            Duration::from_secs(self.config.cache.sweep_interval_secs),
        )
        .spawn(shutdown.resubscribe());

        let _watcher = if self.config.cache.watch_files {
            match FileWatcher::new(&self.config.root, self.cache.clone()).run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "File watcher unavailable, relying on mtime checks");
                    None
                }
            }
        } else {
            None
        };

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        evictor.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<HandlerCache> {
        &self.cache
    }

    /// The fully layered router, for driving without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Catch-all handler: every GET goes through the request router.
async fn serve_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let response = state.router.route(request).await;
    metrics::record_request(response.status().as_u16(), start_time);
    response
}
