//! Periodic TTL eviction.
//!
//! # Responsibilities
//! - Wake up on a fixed interval for the life of the server
//! - Remove cache entries older than the configured TTL
//! - Exit promptly on the shutdown broadcast

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::cache::HandlerCache;

/// Background sweeper for a [`HandlerCache`].
pub struct Evictor {
    cache: Arc<HandlerCache>,
    interval: Duration,
}

impl Evictor {
    pub fn new(cache: Arc<HandlerCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Run the sweep loop on its own task.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            ttl_secs = self.cache.ttl().as_secs(),
            "Cache evictor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be expired yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache evictor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn sweep(&self) {
        let removed = self.cache.evict_expired(Instant::now());
        if removed > 0 {
            tracing::info!(removed, remaining = self.cache.len(), "Evicted expired cache entries");
        } else {
            tracing::trace!(entries = self.cache.len(), "Eviction sweep found nothing to remove");
        }
    }
}
