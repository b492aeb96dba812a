//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use profile_server::config::ServerConfig;
use profile_server::http::HttpServer;
use profile_server::lifecycle::Shutdown;
use profile_server::renderer::{HandlerSet, RenderError, Renderer, ViewHandler};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// View answering with a fixed body.
pub struct Text(pub String);

impl ViewHandler for Text {
    fn serve(&self, _request: &Request<Body>) -> Response {
        self.0.clone().into_response()
    }
}

/// Renderer that counts builds and can be slowed down.
///
/// Files ending in `.bad` fail to build. Every other file gets a `/` view
/// echoing its contents and a `/build` view reporting the build number.
#[derive(Default)]
pub struct CountingRenderer {
    pub builds: AtomicUsize,
    pub delay: Duration,
}

impl CountingRenderer {
    pub fn slow(delay: Duration) -> Self {
        Self {
            builds: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl Renderer for CountingRenderer {
    fn build(&self, resource: &Path) -> Result<HandlerSet, RenderError> {
        let build = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        std::thread::sleep(self.delay);

        if resource.extension().is_some_and(|e| e == "bad") {
            return Err(RenderError::Unsupported("not a profile".into()));
        }
        let contents = std::fs::read_to_string(resource)?;
        Ok(HandlerSet::new()
            .with("/", Text(contents))
            .with("/build", Text(build.to_string())))
    }
}

/// A running server over a temporary root directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub renderer: Arc<CountingRenderer>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn write(&self, name: &str, contents: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port.
pub async fn start_server(renderer: CountingRenderer) -> TestServer {
    start_server_with(renderer, |_| {}).await
}

/// Start a server on an ephemeral port after adjusting its config.
pub async fn start_server_with<F>(renderer: CountingRenderer, configure: F) -> TestServer
where
    F: FnOnce(&mut ServerConfig),
{
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.root = dir.path().to_path_buf();
    configure(&mut config);

    let renderer = Arc::new(renderer);
    let server = HttpServer::new(config, renderer.clone()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        dir,
        renderer,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
