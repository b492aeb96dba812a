//! Cache entry bookkeeping.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::renderer::HandlerSet;

/// Handlers built for one resource, plus what they were built from.
#[derive(Debug)]
pub struct CacheEntry {
    key: PathBuf,
    built_at: Instant,
    source_mtime: SystemTime,
    handlers: Arc<HandlerSet>,
}

impl CacheEntry {
    pub fn new(key: PathBuf, source_mtime: SystemTime, handlers: HandlerSet) -> Self {
        Self {
            key,
            built_at: Instant::now(),
            source_mtime,
            handlers: Arc::new(handlers),
        }
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    pub fn built_at(&self) -> Instant {
        self.built_at
    }

    pub fn source_mtime(&self) -> SystemTime {
        self.source_mtime
    }

    pub fn handlers(&self) -> &Arc<HandlerSet> {
        &self.handlers
    }

    /// True while the file still carries the modification time we built from.
    pub fn is_fresh(&self, current_mtime: SystemTime) -> bool {
        self.source_mtime == current_mtime
    }

    /// Age relative to `now`; zero if `now` predates the build.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.built_at)
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}
