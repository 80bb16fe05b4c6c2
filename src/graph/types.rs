//! Core types for the entity graph.
//!
//! Defines the canonical `{nodes, edges}` shape every renderer and formatter
//! consumes, plus the provenance envelope wrapped around it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Production,
    Experimental,
    Deprecated,
    Orphan,
}

impl Lifecycle {
    /// All lifecycle stages, in display order.
    pub const ALL: [Lifecycle; 4] = [
        Lifecycle::Production,
        Lifecycle::Experimental,
        Lifecycle::Deprecated,
        Lifecycle::Orphan,
    ];

    /// Lenient parse: anything unrecognised is `Production`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "experimental" => Lifecycle::Experimental,
            "deprecated" => Lifecycle::Deprecated,
            "orphan" => Lifecycle::Orphan,
            _ => Lifecycle::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Production => "production",
            Lifecycle::Experimental => "experimental",
            Lifecycle::Deprecated => "deprecated",
            Lifecycle::Orphan => "orphan",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of an edge (relationship) between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// `from` needs `to` to work (forward `dependencies` list).
    Depends,
    /// `from` consumes `to` (reverse `usedBy` list).
    Uses,
}

impl EdgeKind {
    /// Lenient parse: only `"uses"` maps to [`EdgeKind::Uses`].
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("uses") {
            EdgeKind::Uses
        } else {
            EdgeKind::Depends
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Depends => write!(f, "depends"),
            EdgeKind::Uses => write!(f, "uses"),
        }
    }
}

/// Where a graph snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The live analysis provider.
    Live,
    /// The static entity registry.
    Registry,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Live => write!(f, "live"),
            SourceKind::Registry => write!(f, "registry"),
        }
    }
}

/// A single entity in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique within a snapshot.
    pub id: String,
    pub label: String,
    /// Declared entity type (agent, task, template, ...).
    #[serde(rename = "type")]
    pub entity_type: String,
    pub path: String,
    /// Refined category, see [`crate::graph::detect_category`].
    pub category: String,
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        path: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            entity_type: entity_type.into(),
            path: path.into(),
            category: category.into(),
            lifecycle: Lifecycle::Production,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// A directed relationship between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// The bare `{nodes, edges}` pair, before provenance is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphParts {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphParts {
    pub fn empty() -> Self {
        Self::default()
    }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The canonical graph envelope: data plus provenance.
///
/// Immutable once built; a cache refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    pub source: SourceKind,
    pub is_fallback: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl GraphData {
    /// Wrap bare graph parts with provenance.
    pub fn wrap(parts: GraphParts, source: SourceKind, timestamp: u64) -> Self {
        Self {
            nodes: parts.nodes,
            edges: parts.edges,
            source,
            is_fallback: source == SourceKind::Registry,
            timestamp,
        }
    }

    /// An empty registry-fallback envelope.
    pub fn empty_fallback(timestamp: u64) -> Self {
        Self::wrap(GraphParts::empty(), SourceKind::Registry, timestamp)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Outgoing `depends` targets of a node, in edge order.
    pub fn depends_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.kind == EdgeKind::Depends && e.from == id)
            .map(|e| e.to.as_str())
    }
}
