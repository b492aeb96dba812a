//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming GET path
//!     → path.rs (split at /ui, normalize sub-route, resolve under root)
//!     → router.rs
//!         marker present → HandlerCache::get → HandlerSet[sub-route]
//!         directory      → listing
//!         regular file   → eager build → 302 to <path>/ui/
//!         anything else  → 404
//! ```
//!
//! # Design Decisions
//! - Deterministic: the same path always takes the same branch
//! - Exact sub-route matching only

pub mod path;
pub mod router;

pub use path::{normalize_sub_route, resolve_under_root, split_marker, PathError, MARKER};
pub use router::{RequestRouter, RouteError};
