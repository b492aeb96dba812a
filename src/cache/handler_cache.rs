//! Lazily built, mtime-validated handler sets.
//!
//! # Responsibilities
//! - Serve warm handler sets straight from a concurrent map
//! - Collapse concurrent builds of one key into a single renderer call
//! - Drop entries whose source file changed since they were built
//! - Expose explicit invalidation and TTL sweeps to the evictor
//!
//! # Design Decisions
//! - Entries are `Arc`s and are replaced, never mutated
//! - Build slots are per key, so a slow build only blocks its own key
//! - Builds run on their own task; a waiter giving up never restarts one
//! - Failed builds are never stored; the next request retries
//! - Conditional removes (`remove_if` + `Arc::ptr_eq`) keep sweeps from
//!   deleting an entry that was rebuilt in the meantime

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::watch;

use crate::cache::entry::CacheEntry;
use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::renderer::{HandlerSet, RenderError, Renderer};

/// How many times `get` rejoins a build that turned out to be for an older
/// revision of the file before settling for it.
const MAX_BUILD_ROUNDS: usize = 2;

/// Errors returned by [`HandlerCache::get`].
///
/// Cloneable so every caller waiting on one build receives the same error.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The resource does not exist.
    #[error("Resource not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The resource exists but is not a regular file.
    #[error("Resource is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Reading the resource's metadata failed.
    #[error("Failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The renderer could not build the resource's views.
    #[error("Failed to build views for {}: {source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: Arc<RenderError>,
    },

    /// The renderer panicked or its task was cancelled.
    #[error("Build task for {} aborted: {reason}", path.display())]
    BuildAborted { path: PathBuf, reason: String },
}

impl CacheError {
    /// True for errors that mean "there is nothing to serve here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::NotAFile(_))
    }
}

/// True for I/O errors that mean the path does not name anything.
pub(crate) fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

type BuildResult = Result<Arc<CacheEntry>, CacheError>;

/// One in-flight build. The build task publishes its result once; every
/// caller for the key waits on a clone of the receiver.
struct BuildSlot {
    result: watch::Receiver<Option<BuildResult>>,
}

impl BuildSlot {
    async fn wait(&self, key: &Path) -> BuildResult {
        let mut result = self.result.clone();
        let published = match result.wait_for(Option::is_some).await {
            Ok(value) => value.as_ref().cloned(),
            Err(_) => None,
        };
        published.unwrap_or_else(|| {
            Err(CacheError::BuildAborted {
                path: key.to_path_buf(),
                reason: "build task ended without a result".to_string(),
            })
        })
    }
}

/// Removes the key's slot when the build task finishes, even if it unwinds.
struct SlotRelease {
    inner: Arc<CacheInner>,
    key: PathBuf,
    slot: Arc<BuildSlot>,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        self.inner
            .in_flight
            .remove_if(&self.key, |_, current| Arc::ptr_eq(current, &self.slot));
    }
}

enum Lookup {
    Hit(Arc<CacheEntry>),
    Stale(Arc<CacheEntry>),
    Miss,
}

/// State shared between the cache handle and its build tasks.
struct CacheInner {
    entries: DashMap<PathBuf, Arc<CacheEntry>>,
    in_flight: DashMap<PathBuf, Arc<BuildSlot>>,
    renderer: Arc<dyn Renderer>,
    ttl: Duration,
}

/// Process-wide cache of handler sets keyed by resource path.
pub struct HandlerCache {
    inner: Arc<CacheInner>,
}

impl HandlerCache {
    /// Create an empty cache.
    pub fn new(renderer: Arc<dyn Renderer>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                renderer,
                ttl,
            }),
        }
    }

    /// Create an empty cache from configuration.
    pub fn from_config(renderer: Arc<dyn Renderer>, config: &CacheConfig) -> Self {
        Self::new(renderer, Duration::from_secs(config.ttl_secs))
    }

    /// Return the handler set for `key`, building it if needed.
    ///
    /// `key` must already be resolved inside the served root. Dropping the
    /// returned future does not cancel a build it started.
    pub async fn get(&self, key: &Path) -> Result<Arc<HandlerSet>, CacheError> {
        let mut rounds = 0;
        loop {
            rounds += 1;
            let observed = stat_source(key).await?;

            match self.inner.lookup(key, observed) {
                Lookup::Hit(entry) => {
                    metrics::record_cache_lookup("hit");
                    return Ok(entry.handlers().clone());
                }
                Lookup::Stale(entry) => {
                    metrics::record_cache_lookup("stale");
                    tracing::debug!(
                        key = %key.display(),
                        cached_mtime = ?entry.source_mtime(),
                        observed_mtime = ?observed,
                        "Source changed, discarding cached views"
                    );
                }
                Lookup::Miss => metrics::record_cache_lookup("miss"),
            }

            let entry = self.join_build(key).await?;
            if entry.is_fresh(observed) || rounds >= MAX_BUILD_ROUNDS {
                return Ok(entry.handlers().clone());
            }
            tracing::debug!(
                key = %key.display(),
                "Joined a build of an older revision, retrying"
            );
        }
    }

    /// Wait on the key's in-flight build, starting one if there is none.
    async fn join_build(&self, key: &Path) -> BuildResult {
        let (slot, publisher) = match self.inner.in_flight.entry(key.to_path_buf()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), None),
            Entry::Vacant(vacant) => {
                let (tx, rx) = watch::channel(None);
                let slot = Arc::new(BuildSlot { result: rx });
                vacant.insert(slot.clone());
                (slot, Some(tx))
            }
        };

        if let Some(tx) = publisher {
            let release = SlotRelease {
                inner: self.inner.clone(),
                key: key.to_path_buf(),
                slot: slot.clone(),
            };
            tokio::spawn(async move {
                let result = release.inner.build(&release.key).await;
                // Later callers must start a fresh build, not reuse this result.
                drop(release);
                let _ = tx.send(Some(result));
            });
        }

        slot.wait(key).await
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &Path) -> bool {
        let removed = self.inner.entries.remove(key).is_some();
        if removed {
            metrics::record_cache_eviction("invalidated");
            metrics::record_cache_size(self.inner.entries.len());
            tracing::debug!(key = %key.display(), "Cache entry invalidated");
        }
        removed
    }

    /// Remove every entry older than the TTL as of `now`.
    ///
    /// Returns the number of entries removed. Entries that disappear or get
    /// rebuilt between the scan and the removal are left alone.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let entries = &self.inner.entries;
        let expired: Vec<Arc<CacheEntry>> = entries
            .iter()
            .filter(|e| e.value().is_expired(now, self.inner.ttl))
            .map(|e| e.value().clone())
            .collect();

        let mut removed = 0;
        for entry in expired {
            if entries
                .remove_if(entry.key(), |_, current| Arc::ptr_eq(current, &entry))
                .is_some()
            {
                tracing::debug!(
                    key = %entry.key().display(),
                    age_secs = entry.age(now).as_secs(),
                    "Evicted expired cache entry"
                );
                metrics::record_cache_eviction("expired");
                removed += 1;
            }
        }
        metrics::record_cache_size(entries.len());
        removed
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.inner.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }
}

impl CacheInner {
    /// Read-only check of the stored entry against an observed mtime.
    ///
    /// Never removes anything: `observed` may predate an entry that a
    /// concurrent rebuild just stored.
    fn lookup(&self, key: &Path, observed: SystemTime) -> Lookup {
        let Some(entry) = self.entries.get(key).map(|e| e.value().clone()) else {
            return Lookup::Miss;
        };
        if entry.is_fresh(observed) {
            Lookup::Hit(entry)
        } else {
            Lookup::Stale(entry)
        }
    }

    /// Runs on the build task; at most one per key at a time.
    async fn build(&self, key: &Path) -> BuildResult {
        // A previous build may have stored a fresh entry after the caller's lookup.
        let mtime = stat_source(key).await?;
        match self.lookup(key, mtime) {
            Lookup::Hit(entry) => return Ok(entry),
            Lookup::Stale(stale) => {
                // Stale against a stat taken inside the build slot, so no
                // concurrent rebuild can have replaced it.
                self.entries
                    .remove_if(key, |_, current| Arc::ptr_eq(current, &stale));
            }
            Lookup::Miss => {}
        }

        let renderer = self.renderer.clone();
        let resource = key.to_path_buf();
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || renderer.build(&resource)).await;
        metrics::record_build_duration(started.elapsed());

        let handlers = match outcome {
            Ok(Ok(handlers)) => handlers,
            Ok(Err(e)) => {
                metrics::record_cache_build("error");
                tracing::warn!(key = %key.display(), error = %e, "Renderer failed");
                return Err(CacheError::Build {
                    path: key.to_path_buf(),
                    source: Arc::new(e),
                });
            }
            Err(e) => {
                metrics::record_cache_build("error");
                tracing::error!(key = %key.display(), error = %e, "Renderer task aborted");
                return Err(CacheError::BuildAborted {
                    path: key.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let entry = Arc::new(CacheEntry::new(key.to_path_buf(), mtime, handlers));
        self.entries.insert(key.to_path_buf(), entry.clone());
        metrics::record_cache_build("ok");
        metrics::record_cache_size(self.entries.len());
        tracing::info!(
            key = %key.display(),
            routes = entry.handlers().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built views"
        );
        Ok(entry)
    }
}

impl std::fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCache")
            .field("entries", &self.inner.entries.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

async fn stat_source(key: &Path) -> Result<SystemTime, CacheError> {
    let metadata = tokio::fs::metadata(key).await.map_err(|e| {
        if is_missing(&e) {
            CacheError::NotFound(key.to_path_buf())
        } else {
            CacheError::Stat {
                path: key.to_path_buf(),
                source: Arc::new(e),
            }
        }
    })?;
    if !metadata.is_file() {
        return Err(CacheError::NotAFile(key.to_path_buf()));
    }
    metadata.modified().map_err(|e| CacheError::Stat {
        path: key.to_path_buf(),
        source: Arc::new(e),
    })
}
