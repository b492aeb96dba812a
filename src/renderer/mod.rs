//! Rendering collaborators.
//!
//! # Data Flow
//! ```text
//! resource path
//!     → Renderer::build (runs on the blocking pool)
//!     → HandlerSet { "/" → view, "/meta" → view, ... }
//!     → stored in the handler cache, dispatched by the router
//! ```
//!
//! # Design Decisions
//! - Renderers are trait objects so tests can substitute canned handlers
//! - Builds are synchronous; the cache moves them off the async workers
//! - A handler set is immutable once built; changes mean a rebuild

pub mod handler;
pub mod inspect;

use std::path::Path;

use thiserror::Error;

pub use handler::{HandlerSet, ViewHandler};
pub use inspect::InspectRenderer;

/// Errors a renderer can report for one resource.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Reading the resource failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The resource exceeds the configured size limit.
    #[error("File of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    /// The resource is in a format this renderer cannot handle.
    #[error("Unsupported format: {0}")]
    Unsupported(String),
}

/// Builds the views for a single resource.
pub trait Renderer: Send + Sync + 'static {
    /// Construct the handler set for `resource`.
    fn build(&self, resource: &Path) -> Result<HandlerSet, RenderError>;
}
