//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all GET route)
//!     → request.rs (add request ID, open request span)
//!     → [routing decides listing, redirect or cached view]
//!     → response.rs (error mapping, HTML escaping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
