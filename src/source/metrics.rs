//! Provider cache and latency metrics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::{AnalysisProvider, ProviderMetricsReport};
use super::{Source, TtlCache};
use crate::clock::SharedClock;

/// Most recent latency samples kept in the envelope.
pub const LATENCY_LOG_CAP: usize = 100;

/// Self-reported circuit breaker state of the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    #[default]
    #[serde(rename = "CLOSED")]
    Closed,
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "HALF-OPEN")]
    HalfOpen,
}

impl CircuitState {
    /// Lenient parse: unknown states read as `CLOSED`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "OPEN" => CircuitState::Open,
            "HALF-OPEN" => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF-OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatencySample {
    pub duration_ms: f64,
    pub is_cache_hit: bool,
}

impl LatencySample {
    pub fn new(duration_ms: f64, is_cache_hit: bool) -> Self {
        Self {
            duration_ms,
            is_cache_hit,
        }
    }
}

/// Provider metrics envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub circuit_breaker_state: CircuitState,
    pub circuit_breaker_failures: u32,
    /// Oldest first, at most [`LATENCY_LOG_CAP`] entries.
    pub latency_log: Vec<LatencySample>,
    pub provider_available: bool,
    pub active_provider: Option<String>,
    pub timestamp: u64,
}

impl ProviderMetrics {
    /// Placeholder used whenever the provider cannot be asked.
    pub fn offline(timestamp: u64) -> Self {
        Self {
            cache_hits: 0,
            cache_misses: 0,
            cache_hit_rate: 0.0,
            circuit_breaker_state: CircuitState::Closed,
            circuit_breaker_failures: 0,
            latency_log: Vec::new(),
            provider_available: false,
            active_provider: None,
            timestamp,
        }
    }

    pub fn from_report(report: ProviderMetricsReport, provider: &str, timestamp: u64) -> Self {
        let circuit_breaker_state = report.circuit_state();
        let mut latency_log = report.latency_log.unwrap_or_default();
        if latency_log.len() > LATENCY_LOG_CAP {
            latency_log.drain(..latency_log.len() - LATENCY_LOG_CAP);
        }
        Self {
            cache_hits: report.cache_hits.unwrap_or(0),
            cache_misses: report.cache_misses.unwrap_or(0),
            cache_hit_rate: report.cache_hit_rate.unwrap_or(0.0),
            circuit_breaker_state,
            circuit_breaker_failures: report.circuit_breaker_failures.unwrap_or(0),
            latency_log,
            provider_available: true,
            active_provider: report.active_provider.or_else(|| Some(provider.to_string())),
            timestamp,
        }
    }

    /// The last `n` latency samples, oldest first.
    pub fn recent_latency(&self, n: usize) -> &[LatencySample] {
        let start = self.latency_log.len().saturating_sub(n);
        &self.latency_log[start..]
    }
}

pub struct MetricsSource {
    provider: Arc<dyn AnalysisProvider>,
    cache: TtlCache<ProviderMetrics>,
}

impl MetricsSource {
    pub fn new(provider: Arc<dyn AnalysisProvider>, clock: SharedClock, ttl: Duration) -> Self {
        Self {
            provider,
            cache: TtlCache::new(clock, ttl),
        }
    }

    fn fetch(&self) -> ProviderMetrics {
        let now = self.cache.now_ms();
        if !self.provider.is_available() {
            debug!(provider = self.provider.name(), "provider unavailable, metrics offline");
            return ProviderMetrics::offline(now);
        }
        match self.provider.metrics() {
            Ok(report) => ProviderMetrics::from_report(report, self.provider.name(), now),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "metrics unavailable");
                ProviderMetrics::offline(now)
            }
        }
    }
}

#[async_trait::async_trait]
impl Source for MetricsSource {
    type Output = ProviderMetrics;

    async fn get_data(&mut self) -> ProviderMetrics {
        if let Some(hit) = self.cache.fresh() {
            debug!("metrics cache hit");
            return hit.clone();
        }
        let metrics = self.fetch();
        self.cache.store(metrics)
    }

    fn last_update(&self) -> u64 {
        self.cache.last_update()
    }

    fn is_stale(&self) -> bool {
        self.cache.is_stale()
    }
}
