//! Profile server library.
//!
//! Serves a directory over HTTP. Directories render as listings, plain files
//! redirect to their `/ui/` view, and views are answered by handler sets
//! built lazily by a [`renderer::Renderer`] and kept in a [`cache::HandlerCache`].

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod listing;
pub mod observability;
pub mod renderer;
pub mod routing;

pub use cache::HandlerCache;
pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use renderer::{HandlerSet, Renderer, ViewHandler};
pub use routing::RequestRouter;
