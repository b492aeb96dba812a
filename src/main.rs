//! Profile server
//!
//! Browse lazily rendered views of the files under a directory.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /a/b.prof/ui/hex
//!             │
//!             ▼
//!     ┌──────────────┐   marker?   ┌──────────────┐  miss/stale  ┌──────────┐
//!     │ http server  │────────────▶│ HandlerCache │─────────────▶│ Renderer │
//!     │ (axum+tower) │             │ (single-     │◀─────────────│ (blocking│
//!     └──────┬───────┘             │  flight)     │  HandlerSet  │  pool)   │
//!            │ no marker           └──────┬───────┘              └──────────┘
//!            ▼                            │ view lookup
//!     listing / 302 → /ui/                ▼
//!                                   ViewHandler::serve
//!
//!     Evictor (TTL sweep) and FileWatcher (optional) prune the cache.
//! ```

use clap::Parser;

use profile_server::config::Cli;
use profile_server::lifecycle::startup;
use profile_server::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "profile-server starting");

    startup::run(config).await?;
    Ok(())
}
