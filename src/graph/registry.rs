//! The static entity registry: loading and conversion to a graph.
//!
//! The registry file is owned by an external tool; we only read it. Its
//! shape is `{metadata: {...}, entities: {category: {id: {...}}}}`.

use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::category::detect_category;
use super::types::{EdgeKind, GraphEdge, GraphNode, GraphParts, Lifecycle};
use crate::error::{GraphError, Result};

/// Registry-level metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryMetadata {
    pub entity_count: u64,
    pub last_updated: Option<String>,
    pub version: Option<String>,
}

/// One entity as recorded in the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryEntry {
    pub id: String,
    pub path: String,
    pub entity_type: Option<String>,
    pub dependencies: Vec<String>,
    pub used_by: Vec<String>,
    pub lifecycle: Option<Lifecycle>,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn depends_on(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    pub fn used_by(mut self, consumer: impl Into<String>) -> Self {
        self.used_by.push(consumer.into());
        self
    }
}

/// A named group of entities, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryCategory {
    pub name: String,
    pub entries: Vec<RegistryEntry>,
}

/// A parsed entity registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    pub metadata: RegistryMetadata,
    pub categories: Vec<RegistryCategory>,
}

impl Registry {
    /// Parse registry YAML. Only syntax errors fail; odd shapes are skipped.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(raw)?;
        Ok(Self::from_value(&doc))
    }

    /// Build from an already-parsed YAML document.
    pub fn from_value(doc: &Value) -> Self {
        let metadata = doc
            .get("metadata")
            .and_then(Value::as_mapping)
            .map(parse_metadata)
            .unwrap_or_default();

        let categories = doc
            .get("entities")
            .and_then(Value::as_mapping)
            .map(|entities| {
                entities
                    .iter()
                    .filter_map(|(name, items)| {
                        let name = scalar_text(name)?;
                        // Non-mapping categories are not entity groups.
                        let items = items.as_mapping()?;
                        Some(RegistryCategory {
                            entries: items
                                .iter()
                                .filter_map(|(id, entity)| Some(parse_entry(scalar_text(id)?, entity)))
                                .collect(),
                            name,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            metadata,
            categories,
        }
    }
}

fn parse_metadata(map: &Mapping) -> RegistryMetadata {
    RegistryMetadata {
        entity_count: map
            .get("entityCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        last_updated: map.get("lastUpdated").and_then(scalar_text),
        version: map.get("version").and_then(scalar_text),
    }
}

fn parse_entry(id: String, entity: &Value) -> RegistryEntry {
    // A key with no mapping body (`id:` or `id: text`) still names an entity.
    let Some(fields) = entity.as_mapping() else {
        return RegistryEntry::new(id);
    };
    RegistryEntry {
        path: fields.get("path").and_then(scalar_text).unwrap_or_default(),
        entity_type: fields.get("type").and_then(scalar_text),
        dependencies: string_seq(fields.get("dependencies")),
        used_by: string_seq(fields.get("usedBy")),
        lifecycle: fields
            .get("lifecycle")
            .and_then(scalar_text)
            .map(|l| Lifecycle::parse(&l)),
        id,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_seq(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default()
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Anything that can produce a registry snapshot.
pub trait RegistryLoader: Send + Sync {
    fn load(&self) -> Result<Registry>;

    /// The backing file, when there is one (used by watch mode).
    fn watch_path(&self) -> Option<&Path> {
        None
    }
}

/// Reads the registry from a YAML file on every call.
#[derive(Debug, Clone)]
pub struct YamlRegistryLoader {
    path: PathBuf,
}

impl YamlRegistryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegistryLoader for YamlRegistryLoader {
    fn load(&self) -> Result<Registry> {
        if !self.path.exists() {
            return Err(GraphError::RegistryNotFound(self.path.clone()));
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let registry = Registry::from_yaml_str(&raw)?;
        debug!(
            path = %self.path.display(),
            categories = registry.categories.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// An in-memory registry is its own loader.
impl RegistryLoader for Registry {
    fn load(&self) -> Result<Registry> {
        Ok(self.clone())
    }
}

// ─── Graph conversion ────────────────────────────────────────────────────────

/// Convert a registry into graph parts.
///
/// Emits one node per entity and synthesizes `depends` edges from each
/// `dependencies` list and `uses` edges from each `usedBy` list. Edges are
/// deduplicated on `(from, kind, to)`.
pub fn registry_to_graph(registry: &Registry) -> GraphParts {
    let mut parts = GraphParts::empty();
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_edges: HashSet<(String, EdgeKind, String)> = HashSet::new();

    let mut push_edge = |edges: &mut Vec<GraphEdge>, from: &str, kind: EdgeKind, to: &str| {
        if seen_edges.insert((from.to_string(), kind, to.to_string())) {
            edges.push(GraphEdge::new(from, to, kind));
        }
    };

    for category in &registry.categories {
        for entry in &category.entries {
            // First occurrence wins; later entries still contribute edges.
            if seen_ids.insert(entry.id.as_str()) {
                parts.nodes.push(
                    GraphNode::new(
                        entry.id.clone(),
                        entry.entity_type.clone().unwrap_or_else(|| category.name.clone()),
                        entry.path.clone(),
                        detect_category(&category.name, &entry.path),
                    )
                    .with_lifecycle(entry.lifecycle.unwrap_or_default()),
                );
            } else {
                warn!(id = %entry.id, category = %category.name, "duplicate registry id, keeping first");
            }

            for dep in &entry.dependencies {
                push_edge(&mut parts.edges, &entry.id, EdgeKind::Depends, dep);
            }
            for consumer in &entry.used_by {
                push_edge(&mut parts.edges, consumer, EdgeKind::Uses, &entry.id);
            }
        }
    }

    parts
}
