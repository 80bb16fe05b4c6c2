//! Graph source: live provider first, registry as fallback.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::AnalysisProvider;
use super::{Source, TtlCache};
use crate::clock::SharedClock;
use crate::graph::{
    normalize_dependencies, registry_to_graph, GraphData, RegistryLoader, SourceKind,
};

pub struct GraphSource {
    provider: Arc<dyn AnalysisProvider>,
    registry: Arc<dyn RegistryLoader>,
    root: PathBuf,
    cache: TtlCache<GraphData>,
}

impl GraphSource {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        registry: Arc<dyn RegistryLoader>,
        root: impl Into<PathBuf>,
        clock: SharedClock,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            registry,
            root: root.into(),
            cache: TtlCache::new(clock, ttl),
        }
    }

    /// Forget the cached snapshot, e.g. after the registry file changed.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    async fn fetch(&self) -> GraphData {
        let now = self.cache.now_ms();

        if !self.provider.is_available() {
            debug!(provider = self.provider.name(), "provider unavailable, using registry");
            return self.registry_fallback(now);
        }

        match self.provider.analyze_dependencies(&self.root).await {
            Ok(raw) => GraphData::wrap(normalize_dependencies(&raw), SourceKind::Live, now),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "dependency analysis failed, using registry");
                self.registry_fallback(now)
            }
        }
    }

    fn registry_fallback(&self, now: u64) -> GraphData {
        match self.registry.load() {
            Ok(registry) => GraphData::wrap(registry_to_graph(&registry), SourceKind::Registry, now),
            Err(e) => {
                warn!(error = %e, "registry unavailable, serving empty graph");
                GraphData::empty_fallback(now)
            }
        }
    }
}

#[async_trait::async_trait]
impl Source for GraphSource {
    type Output = GraphData;

    async fn get_data(&mut self) -> GraphData {
        if let Some(hit) = self.cache.fresh() {
            debug!("graph cache hit");
            return hit.clone();
        }
        let data = self.fetch().await;
        debug!(nodes = data.nodes.len(), source = %data.source, "graph cache refreshed");
        self.cache.store(data)
    }

    fn last_update(&self) -> u64 {
        self.cache.last_update()
    }

    fn is_stale(&self) -> bool {
        self.cache.is_stale()
    }
}
