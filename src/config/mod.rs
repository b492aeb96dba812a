//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)
//!     → optional config file (TOML) → loader.rs (parse & deserialize)
//!     → flags applied on top
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to startup, which builds every subsystem from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{read_config, ConfigError};
pub use schema::{
    CacheConfig, ListenerConfig, ObservabilityConfig, RendererConfig, ServerConfig, TimeoutConfig,
};
pub use validation::ValidationError;
