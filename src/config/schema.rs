//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the profile server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory whose files are served.
    pub root: PathBuf,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Handler cache settings.
    pub cache: CacheConfig,

    /// Built-in renderer settings.
    pub renderer: RendererConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            listener: ListenerConfig::default(),
            cache: CacheConfig::default(),
            renderer: RendererConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:26817"); a bare ":port" binds all interfaces.
    pub bind_address: String,
}

impl ListenerConfig {
    /// The bind address with a missing host filled in.
    pub fn socket_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":26817".to_string(),
        }
    }
}

/// Handler cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum age of an entry before the evictor drops it.
    pub ttl_secs: u64,

    /// How often the evictor sweeps.
    pub sweep_interval_secs: u64,

    /// Invalidate entries on filesystem change events.
    pub watch_files: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
            watch_files: false,
        }
    }
}

/// Built-in renderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Files larger than this are refused.
    pub max_file_bytes: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.listener.bind_address, ":26817");
        assert_eq!(config.listener.socket_address(), "0.0.0.0:26817");
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.cache.sweep_interval_secs, 300);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            root = "/srv/profiles"

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.root, PathBuf::from("/srv/profiles"));
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.sweep_interval_secs, 300);
        assert_eq!(config.listener.bind_address, ":26817");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_explicit_host_is_kept() {
        let listener = ListenerConfig {
            bind_address: "127.0.0.1:8080".into(),
        };
        assert_eq!(listener.socket_address(), "127.0.0.1:8080");
    }
}
