//! Entity statistics from the registry.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Source, TtlCache};
use crate::clock::SharedClock;
use crate::graph::{Registry, RegistryLoader};

/// Entity count for one registry category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    #[serde(skip)]
    pub name: String,
    pub count: usize,
    /// Share of `total_entities`, 0..=100. Zero when the total is zero.
    pub pct: f64,
}

/// Entity statistics envelope.
///
/// `total_entities` is the registry's declared `entityCount`, which may
/// differ from the sum of category counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStats {
    pub total_entities: u64,
    /// In registry order. Serialized as a `{name: {count, pct}}` map.
    #[serde(serialize_with = "categories_as_map")]
    pub categories: Vec<CategoryCount>,
    pub last_updated: Option<String>,
    pub version: Option<String>,
    pub timestamp: u64,
}

fn categories_as_map<S: Serializer>(cats: &[CategoryCount], s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(cats.len()))?;
    for cat in cats {
        map.serialize_entry(&cat.name, cat)?;
    }
    map.end()
}

impl EntityStats {
    pub fn from_registry(registry: &Registry, timestamp: u64) -> Self {
        let total = registry.metadata.entity_count;
        let categories = registry
            .categories
            .iter()
            .map(|cat| {
                let count = cat.entries.len();
                CategoryCount {
                    name: cat.name.clone(),
                    count,
                    pct: if total > 0 {
                        count as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        Self {
            total_entities: total,
            categories,
            last_updated: registry.metadata.last_updated.clone(),
            version: registry.metadata.version.clone(),
            timestamp,
        }
    }

    pub fn empty(timestamp: u64) -> Self {
        Self {
            total_entities: 0,
            categories: Vec::new(),
            last_updated: None,
            version: None,
            timestamp,
        }
    }

    pub fn category(&self, name: &str) -> Option<&CategoryCount> {
        self.categories.iter().find(|c| c.name == name)
    }
}

pub struct StatsSource {
    registry: Arc<dyn RegistryLoader>,
    cache: TtlCache<EntityStats>,
}

impl StatsSource {
    pub fn new(registry: Arc<dyn RegistryLoader>, clock: SharedClock, ttl: Duration) -> Self {
        Self {
            registry,
            cache: TtlCache::new(clock, ttl),
        }
    }

    fn fetch(&self) -> EntityStats {
        let now = self.cache.now_ms();
        match self.registry.load() {
            Ok(registry) => EntityStats::from_registry(&registry, now),
            Err(e) => {
                warn!(error = %e, "registry unavailable, serving empty stats");
                EntityStats::empty(now)
            }
        }
    }
}

#[async_trait::async_trait]
impl Source for StatsSource {
    type Output = EntityStats;

    async fn get_data(&mut self) -> EntityStats {
        if let Some(hit) = self.cache.fresh() {
            debug!("stats cache hit");
            return hit.clone();
        }
        let stats = self.fetch();
        self.cache.store(stats)
    }

    fn last_update(&self) -> u64 {
        self.cache.last_update()
    }

    fn is_stale(&self) -> bool {
        self.cache.is_stale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{GraphError, Result};
    use crate::graph::{RegistryCategory, RegistryEntry, RegistryMetadata};

    struct BrokenRegistry;

    impl RegistryLoader for BrokenRegistry {
        fn load(&self) -> Result<Registry> {
            Err(GraphError::RegistryNotFound("gone.yaml".into()))
        }
    }

    fn registry(entity_count: u64) -> Registry {
        Registry {
            metadata: RegistryMetadata {
                entity_count,
                last_updated: Some("2026-01-15".into()),
                version: Some("1.0.0".into()),
            },
            categories: vec![
                RegistryCategory {
                    name: "tasks".into(),
                    entries: vec![
                        RegistryEntry::new("a").depends_on("b"),
                        RegistryEntry::new("b").used_by("a"),
                    ],
                },
                RegistryCategory {
                    name: "agents".into(),
                    entries: vec![RegistryEntry::new("dev")],
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_percentages_use_declared_total() {
        let clock = ManualClock::new(500);
        let mut src = StatsSource::new(Arc::new(registry(4)), Arc::new(clock), Duration::from_secs(5));
        let stats = src.get_data().await;

        assert_eq!(stats.total_entities, 4);
        let tasks = stats.category("tasks").unwrap();
        assert_eq!(tasks.count, 2);
        assert!((tasks.pct - 50.0).abs() < 1e-9);
        assert_eq!(stats.version.as_deref(), Some("1.0.0"));
        assert_eq!(stats.timestamp, 500);
    }

    #[test]
    fn test_two_entity_registry_is_all_tasks() {
        let mut reg = registry(2);
        reg.categories.truncate(1);
        let stats = EntityStats::from_registry(&reg, 0);
        assert_eq!(
            stats.category("tasks"),
            Some(&CategoryCount {
                name: "tasks".into(),
                count: 2,
                pct: 100.0
            })
        );
    }

    #[test]
    fn test_zero_total_gives_zero_pct() {
        let stats = EntityStats::from_registry(&registry(0), 0);
        assert!(stats.categories.iter().all(|c| c.pct == 0.0));
    }

    #[test]
    fn test_wire_shape_is_keyed_map() {
        let stats = EntityStats::from_registry(&registry(3), 9);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalEntities"], 3);
        assert_eq!(value["categories"]["agents"]["count"], 1);
        assert!(value["categories"]["agents"].get("name").is_none());
        assert_eq!(value["lastUpdated"], "2026-01-15");
    }

    #[tokio::test]
    async fn test_load_failure_gives_empty_stats() {
        let mut src = StatsSource::new(
            Arc::new(BrokenRegistry),
            Arc::new(ManualClock::new(42)),
            Duration::from_secs(5),
        );
        let stats = src.get_data().await;
        assert_eq!(stats, EntityStats::empty(42));
    }
}
