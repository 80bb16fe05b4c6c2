//! Dashboard configuration, read from `<root>/.aios/graph.toml`.
//!
//! Every key is optional. A missing file yields the defaults; a file that
//! fails to parse is reported and ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

/// Location of the config file relative to the project root.
pub const CONFIG_FILE: &str = ".aios/graph.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Entity registry consumed by the fallback path and the stats source.
    pub registry_path: PathBuf,
    /// Directory that receives watch-mode and HTML artifacts.
    pub output_dir: PathBuf,
    /// Dependency dump written by the external analyzer.
    pub analysis_snapshot: PathBuf,
    /// Metrics dump written by the external analyzer.
    pub metrics_snapshot: PathBuf,
    pub cache_ttl_ms: u64,
    pub watch_interval_secs: u64,
    pub debounce_ms: u64,
    /// Items per category in the summary view's compact tree.
    pub summary_per_category: usize,
    pub html_refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(".aios-core/data/entity-registry.yaml"),
            output_dir: PathBuf::from(".aios"),
            analysis_snapshot: PathBuf::from(".aios/code-intel/dependencies.json"),
            metrics_snapshot: PathBuf::from(".aios/code-intel/metrics.json"),
            cache_ttl_ms: 5_000,
            watch_interval_secs: 5,
            debounce_ms: 300,
            summary_per_category: 5,
            html_refresh_secs: 5,
        }
    }
}

impl DashboardConfig {
    /// Load config for a project root, falling back to defaults.
    pub fn load(root: &Path) -> Self {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no dashboard config, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable dashboard config");
                Self::default()
            }
        }
    }

    /// Parse a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Resolve every relative path against the project root.
    pub fn resolve(mut self, root: &Path) -> Self {
        for path in [
            &mut self.registry_path,
            &mut self.output_dir,
            &mut self.analysis_snapshot,
            &mut self.metrics_snapshot,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load(dir.path());
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.cache_ttl_ms, 5_000);
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".aios")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "cache_ttl_ms = 1000\noutput_dir = \"out\"\n",
        )
        .unwrap();

        let config = DashboardConfig::load(dir.path());
        assert_eq!(config.cache_ttl_ms, 1_000);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.watch_interval_secs, 5);
    }

    #[test]
    fn test_garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".aios")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "cache_ttl_ms = [").unwrap();

        assert_eq!(DashboardConfig::load(dir.path()), DashboardConfig::default());
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let config = DashboardConfig {
            output_dir: PathBuf::from("/tmp/graph-out"),
            ..Default::default()
        }
        .resolve(Path::new("/project"));

        assert_eq!(config.output_dir, PathBuf::from("/tmp/graph-out"));
        assert_eq!(
            config.registry_path,
            PathBuf::from("/project/.aios-core/data/entity-registry.yaml")
        );
    }
}
