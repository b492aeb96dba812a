//! Filesystem watcher that invalidates cache entries on change.
//!
//! The mtime check in [`HandlerCache::get`] already guarantees correctness;
//! the watcher only releases memory for files that changed or vanished
//! instead of waiting for the next request or the TTL sweep.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::cache::HandlerCache;

/// Watches the served root and invalidates entries for touched paths.
pub struct FileWatcher {
    root: PathBuf,
    cache: Arc<HandlerCache>,
}

impl FileWatcher {
    pub fn new(root: &Path, cache: Arc<HandlerCache>) -> Self {
        Self {
            root: root.to_path_buf(),
            cache,
        }
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive; dropping it stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let cache = self.cache.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_remove() || event.kind.is_create() {
                        for path in &event.paths {
                            if cache.invalidate(path) {
                                tracing::debug!(path = %path.display(), kind = ?event.kind, "File changed, cache entry dropped");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = %self.root.display(), "File watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{HandlerSet, RenderError, Renderer};
    use std::time::{Duration, Instant};

    struct Empty;

    impl Renderer for Empty {
        fn build(&self, _resource: &Path) -> Result<HandlerSet, RenderError> {
            Ok(HandlerSet::new())
        }
    }

    #[tokio::test]
    async fn test_removed_file_is_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let key = root.join("cpu.prof");
        std::fs::write(&key, b"x").unwrap();

        let cache = Arc::new(HandlerCache::new(Arc::new(Empty), Duration::from_secs(60)));
        cache.get(&key).await.unwrap();

        let _watcher = FileWatcher::new(&root, cache.clone()).run().unwrap();
        std::fs::remove_file(&key).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.contains(&key) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!cache.contains(&key));
    }
}
