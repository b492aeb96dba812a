//! Command-line interface.
//!
//! Flags override values from the optional config file; anything left unset
//! keeps its file or built-in default.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::ServerConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "profile-server")]
#[command(version, about = "Browse lazily rendered views of the files under a directory", long_about = None)]
pub struct Cli {
    /// Directory to serve (default: current directory)
    #[arg(short = 'p', long = "path")]
    pub path: Option<PathBuf>,

    /// Listen address (default: :26817)
    #[arg(long = "listen-address", visible_alias = "addr")]
    pub listen_address: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum age of a cached handler set, in seconds
    #[arg(long)]
    pub cache_ttl_secs: Option<u64>,

    /// Drop cache entries as soon as their files change on disk
    #[arg(long)]
    pub watch_files: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Overwrite `config` with every flag that was given.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(path) = &self.path {
            config.root = path.clone();
        }
        if let Some(addr) = &self.listen_address {
            config.listener.bind_address = addr.clone();
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache.ttl_secs = ttl;
        }
        if self.watch_files {
            config.cache.watch_files = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr.clone();
        }
    }

    /// Resolve the final, validated configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
