//! The live analysis provider boundary.
//!
//! The analyzer itself is external. We consume its dependency dump and its
//! self-reported cache metrics, gated by an availability check.

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::metrics::{CircuitState, LatencySample};
use crate::error::{GraphError, Result};

/// Metrics as reported by a provider. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderMetricsReport {
    pub cache_hits: Option<u64>,
    pub cache_misses: Option<u64>,
    pub cache_hit_rate: Option<f64>,
    pub circuit_breaker_state: Option<String>,
    pub circuit_breaker_failures: Option<u32>,
    pub latency_log: Option<Vec<LatencySample>>,
    pub active_provider: Option<String>,
}

impl ProviderMetricsReport {
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker_state
            .as_deref()
            .map(CircuitState::parse)
            .unwrap_or_default()
    }
}

/// A live dependency-analysis provider.
#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Pre-flight check. When false, callers go straight to their fallback.
    fn is_available(&self) -> bool;

    /// Raw dependency output. Its shape is not fixed; see
    /// [`crate::graph::normalize_dependencies`].
    async fn analyze_dependencies(&self, root: &Path) -> Result<Value>;

    fn metrics(&self) -> Result<ProviderMetricsReport>;
}

/// Reads the JSON dumps an external analyzer leaves on disk.
///
/// Available iff the dependency dump exists. A missing metrics dump reads
/// as an all-zero report.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    dependencies: PathBuf,
    metrics: PathBuf,
}

impl SnapshotProvider {
    pub fn new(dependencies: impl Into<PathBuf>, metrics: impl Into<PathBuf>) -> Self {
        Self {
            dependencies: dependencies.into(),
            metrics: metrics.into(),
        }
    }
}

#[async_trait::async_trait]
impl AnalysisProvider for SnapshotProvider {
    fn name(&self) -> &str {
        "code-intel-snapshot"
    }

    fn is_available(&self) -> bool {
        self.dependencies.is_file()
    }

    async fn analyze_dependencies(&self, root: &Path) -> Result<Value> {
        let path = if self.dependencies.is_relative() {
            root.join(&self.dependencies)
        } else {
            self.dependencies.clone()
        };
        debug!(path = %path.display(), "reading dependency snapshot");
        let raw = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn metrics(&self) -> Result<ProviderMetricsReport> {
        if !self.metrics.is_file() {
            return Ok(ProviderMetricsReport::default());
        }
        let raw = std::fs::read_to_string(&self.metrics)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// A provider that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait::async_trait]
impl AnalysisProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn analyze_dependencies(&self, _root: &Path) -> Result<Value> {
        Err(GraphError::ProviderUnavailable)
    }

    fn metrics(&self) -> Result<ProviderMetricsReport> {
        Err(GraphError::ProviderUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_provider_reads_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let deps = dir.path().join("dependencies.json");
        let metrics = dir.path().join("metrics.json");

        let provider = SnapshotProvider::new(&deps, &metrics);
        assert!(!provider.is_available());

        std::fs::write(&deps, r#"{"nodes": [], "edges": []}"#).unwrap();
        assert!(provider.is_available());
        let raw = provider.analyze_dependencies(dir.path()).await.unwrap();
        assert!(raw["nodes"].is_array());

        // No metrics dump yet: zeroed report.
        assert_eq!(provider.metrics().unwrap(), ProviderMetricsReport::default());

        std::fs::write(
            &metrics,
            r#"{"cacheHits": 8, "cacheMisses": 2, "circuitBreakerState": "HALF-OPEN",
                "latencyLog": [{"durationMs": 12, "isCacheHit": true}]}"#,
        )
        .unwrap();
        let report = provider.metrics().unwrap();
        assert_eq!(report.cache_hits, Some(8));
        assert_eq!(report.circuit_state(), CircuitState::HalfOpen);
        assert_eq!(report.latency_log.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_provider_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let deps = dir.path().join("dependencies.json");
        std::fs::write(&deps, "{not json").unwrap();

        let provider = SnapshotProvider::new(&deps, dir.path().join("m.json"));
        assert!(matches!(
            provider.analyze_dependencies(dir.path()).await,
            Err(GraphError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_provider() {
        let provider = OfflineProvider;
        assert!(!provider.is_available());
        assert!(provider.analyze_dependencies(Path::new(".")).await.is_err());
        assert!(provider.metrics().is_err());
    }
}
