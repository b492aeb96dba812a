//! Handler cache subsystem.
//!
//! # Data Flow
//! ```text
//! RequestRouter
//!     → handler_cache.rs (fast path: concurrent map hit, mtime unchanged)
//!     → on miss/stale: per-key build slot → Renderer (blocking pool)
//!     → entry.rs (CacheEntry stored, Arc<HandlerSet> returned)
//!
//! Background:
//!     evictor.rs  → TTL sweep every interval
//!     watcher.rs  → filesystem events → explicit invalidation (optional)
//! ```
//!
//! # Design Decisions
//! - One live entry per key; replacement instead of mutation
//! - Reads never take an exclusive lock
//! - Eviction never cancels handlers already handed out

pub mod entry;
pub mod evictor;
pub mod handler_cache;
pub mod watcher;

pub use entry::CacheEntry;
pub use evictor::Evictor;
pub use handler_cache::{CacheError, HandlerCache};
pub use watcher::FileWatcher;
