//! Registry statistics with a time-bounded cache.
//!
//! The cache is an explicit value-with-timestamp owned by the service
//! instance. Callers pass the current [`Instant`] in, so expiry can be tested
//! without sleeping.

use crate::config::StatsConfig;
use crate::store::ServerStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::error;

/// A cached value and the instant it was stored.
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    /// The cached value.
    pub value: T,
    /// When the value was stored.
    pub stored_at: Instant,
}

impl<T> CachedValue<T> {
    /// Returns true if the value is younger than `ttl` at `now`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// A single-slot cache whose entry expires after a fixed TTL.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<CachedValue<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if it is still fresh at `now`.
    pub fn get(&self, now: Instant) -> Option<T> {
        self.slot
            .lock()
            .as_ref()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` as of `now`.
    pub fn put(&self, value: T, now: Instant) {
        *self.slot.lock() = Some(CachedValue {
            value,
            stored_at: now,
        });
    }

    /// Drops the cached value.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

/// Registry-wide counts and uptime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Number of server records across all sources.
    pub servers: usize,
    /// Seconds since the service was created.
    pub uptime_seconds: u64,
    /// Crate version.
    pub version: &'static str,
}

/// Computes [`RegistryStats`] from the store, serving cached values within
/// the configured TTL.
pub struct StatsService {
    store: Arc<dyn ServerStore>,
    cache: TtlCache<RegistryStats>,
    call_timeout: Duration,
    started_at: Instant,
}

impl StatsService {
    /// Creates a stats service that counts uptime from now.
    pub fn new(config: StatsConfig, store: Arc<dyn ServerStore>) -> Self {
        Self::started_at(config, store, Instant::now())
    }

    /// Creates a stats service with an explicit start instant.
    pub fn started_at(
        config: StatsConfig,
        store: Arc<dyn ServerStore>,
        started_at: Instant,
    ) -> Self {
        Self {
            store,
            cache: TtlCache::new(config.ttl),
            call_timeout: config.call_timeout,
            started_at,
        }
    }

    /// Returns stats as of now.
    pub async fn stats(&self) -> RegistryStats {
        self.stats_at(Instant::now()).await
    }

    /// Returns stats as of `now`, from cache when fresh.
    ///
    /// A store failure yields zero counts. That fallback is not cached, so
    /// the next call retries the store.
    pub async fn stats_at(&self, now: Instant) -> RegistryStats {
        if let Some(stats) = self.cache.get(now) {
            return stats;
        }

        let uptime_seconds = now.saturating_duration_since(self.started_at).as_secs();
        match tokio::time::timeout(self.call_timeout, self.store.count()).await {
            Ok(Ok(servers)) => {
                let stats = RegistryStats {
                    servers,
                    uptime_seconds,
                    version: env!("CARGO_PKG_VERSION"),
                };
                self.cache.put(stats.clone(), now);
                stats
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to get registry stats");
                Self::fallback(uptime_seconds)
            }
            Err(_) => {
                error!(timeout = ?self.call_timeout, "failed to get registry stats: timed out");
                Self::fallback(uptime_seconds)
            }
        }
    }

    /// Drops cached stats so the next call recomputes them.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn fallback(uptime_seconds: u64) -> RegistryStats {
        RegistryStats {
            servers: 0,
            uptime_seconds,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
