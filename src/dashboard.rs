//! Wiring: one project root, its config, and the collaborators every
//! source is built from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::{system_clock, SharedClock};
use crate::config::DashboardConfig;
use crate::graph::{GraphData, RegistryLoader, YamlRegistryLoader};
use crate::source::{
    AnalysisProvider, GraphSource, MetricsSource, SnapshotProvider, Source, StatsSource,
};

/// The dashboard for one project.
///
/// Cheap to clone. Sources built from it share the provider, registry
/// loader and clock, but each owns its own cache.
#[derive(Clone)]
pub struct Dashboard {
    root: PathBuf,
    config: DashboardConfig,
    provider: Arc<dyn AnalysisProvider>,
    registry: Arc<dyn RegistryLoader>,
    clock: SharedClock,
}

impl Dashboard {
    /// Load `<root>/.aios/graph.toml` and wire the default collaborators.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = DashboardConfig::load(&root);
        Self::with_config(root, config)
    }

    pub fn with_config(root: impl Into<PathBuf>, config: DashboardConfig) -> Self {
        let root = root.into();
        let config = config.resolve(&root);
        Self {
            provider: Arc::new(SnapshotProvider::new(
                config.analysis_snapshot.clone(),
                config.metrics_snapshot.clone(),
            )),
            registry: Arc::new(YamlRegistryLoader::new(config.registry_path.clone())),
            clock: system_clock(),
            root,
            config,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn RegistryLoader>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// The registry file to watch for changes, if the loader has one.
    pub fn registry_file(&self) -> Option<&Path> {
        self.registry.watch_path()
    }

    pub fn graph_source(&self) -> GraphSource {
        GraphSource::new(
            self.provider.clone(),
            self.registry.clone(),
            self.root.clone(),
            self.clock.clone(),
            self.config.cache_ttl(),
        )
    }

    pub fn stats_source(&self) -> StatsSource {
        StatsSource::new(self.registry.clone(), self.clock.clone(), self.config.cache_ttl())
    }

    pub fn metrics_source(&self) -> MetricsSource {
        MetricsSource::new(self.provider.clone(), self.clock.clone(), self.config.cache_ttl())
    }
}

/// One-shot fetch of the current graph envelope.
pub async fn get_graph_data(dashboard: &Dashboard) -> GraphData {
    dashboard.graph_source().get_data().await
}
