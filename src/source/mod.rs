//! Data sources: each wraps one external collaborator behind a TTL cache.
//!
//! Every source resolves with a fully populated envelope. Upstream failures
//! are logged and expressed through envelope fields (`is_fallback`,
//! `provider_available`), never returned as errors.

pub mod graph;
pub mod metrics;
pub mod provider;
pub mod stats;

use std::time::Duration;

use crate::clock::SharedClock;

pub use graph::GraphSource;
pub use metrics::{CircuitState, LatencySample, MetricsSource, ProviderMetrics, LATENCY_LOG_CAP};
pub use provider::{AnalysisProvider, OfflineProvider, ProviderMetricsReport, SnapshotProvider};
pub use stats::{CategoryCount, EntityStats, StatsSource};

/// The shared contract of every data source.
#[async_trait::async_trait]
pub trait Source: Send {
    type Output: Clone + Send;

    /// Current envelope, served from cache while fresh.
    async fn get_data(&mut self) -> Self::Output;

    /// When the cache was last populated (ms since epoch, 0 if never).
    fn last_update(&self) -> u64;

    /// Whether the cache window has elapsed.
    fn is_stale(&self) -> bool;
}

/// Wall-clock TTL memoization for a single envelope.
///
/// Freshness depends only on age since the last `store`, not on whether
/// the stored value came from the primary or the fallback path.
pub struct TtlCache<T> {
    clock: SharedClock,
    ttl_ms: u64,
    value: Option<T>,
    stored_at: u64,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(clock: SharedClock, ttl: Duration) -> Self {
        Self {
            clock,
            ttl_ms: ttl.as_millis() as u64,
            value: None,
            stored_at: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The cached value, if present and not stale.
    pub fn fresh(&self) -> Option<&T> {
        self.value.as_ref().filter(|_| !self.is_stale())
    }

    /// Replace the cached value and restart the window.
    pub fn store(&mut self, value: T) -> T {
        self.stored_at = self.clock.now_ms();
        self.value = Some(value.clone());
        value
    }

    /// Drop the cached value so the next read refetches.
    pub fn invalidate(&mut self) {
        self.value = None;
    }

    pub fn last_update(&self) -> u64 {
        self.stored_at
    }

    pub fn is_stale(&self) -> bool {
        self.clock.now_ms().saturating_sub(self.stored_at) > self.ttl_ms
    }
}
