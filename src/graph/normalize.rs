//! Normalization of live-provider output into canonical graph parts.
//!
//! The provider's output shape is not fixed. Accepted shapes, in priority
//! order:
//!
//! 1. `{nodes: [...], edges: [...]}`: already canonical, passed through.
//! 2. `[{id, dependencies: [...]}, ...]`: flat dependency records.
//! 3. `{dependencies: {id: {dependencies: [...]}, ...}}`: records keyed by id.
//! 4. Anything else: an empty graph.
//!
//! Normalization is total: malformed entries are skipped, never reported.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::category::detect_category;
use super::types::{EdgeKind, GraphEdge, GraphNode, GraphParts, Lifecycle};

/// The recognised input shapes.
enum RawShape<'a> {
    Canonical { nodes: &'a [Value], edges: &'a [Value] },
    Records(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Unrecognised,
}

impl<'a> RawShape<'a> {
    fn of(raw: &'a Value) -> Self {
        match raw {
            Value::Object(obj) => {
                if let (Some(Value::Array(nodes)), Some(Value::Array(edges))) =
                    (obj.get("nodes"), obj.get("edges"))
                {
                    return RawShape::Canonical { nodes, edges };
                }
                match obj.get("dependencies") {
                    Some(Value::Object(keyed)) => RawShape::Keyed(keyed),
                    _ => RawShape::Unrecognised,
                }
            }
            Value::Array(records) => RawShape::Records(records),
            _ => RawShape::Unrecognised,
        }
    }
}

/// Normalize whatever the provider returned into `{nodes, edges}`.
pub fn normalize_dependencies(raw: &Value) -> GraphParts {
    match RawShape::of(raw) {
        RawShape::Canonical { nodes, edges } => from_canonical(nodes, edges),
        RawShape::Records(records) => from_records(records.iter()),
        RawShape::Keyed(keyed) => {
            let flattened: Vec<Value> = keyed
                .iter()
                .map(|(id, entry)| {
                    let mut record = match entry {
                        Value::Object(fields) => fields.clone(),
                        _ => Map::new(),
                    };
                    record.insert("id".to_string(), Value::String(id.clone()));
                    Value::Object(record)
                })
                .collect();
            from_records(flattened.iter())
        }
        RawShape::Unrecognised => GraphParts::empty(),
    }
}

fn from_canonical(nodes: &[Value], edges: &[Value]) -> GraphParts {
    let mut seen = HashSet::new();
    let nodes = nodes
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let id = text_field(obj, &["id"])?;
            if !seen.insert(id.clone()) {
                return None;
            }
            let entity_type = text_field(obj, &["type"]).unwrap_or_else(|| "unknown".to_string());
            let path = text_field(obj, &["path"]).unwrap_or_default();
            let declared = text_field(obj, &["category", "type"]).unwrap_or_else(|| "other".to_string());
            let lifecycle = text_field(obj, &["lifecycle"])
                .map(|l| Lifecycle::parse(&l))
                .unwrap_or_default();
            Some(GraphNode {
                label: text_field(obj, &["label"]).unwrap_or_else(|| id.clone()),
                category: detect_category(&declared, &path),
                id,
                entity_type,
                path,
                lifecycle,
            })
        })
        .collect();

    let edges = edges
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let from = text_field(obj, &["from"])?;
            let to = text_field(obj, &["to"])?;
            let kind = text_field(obj, &["type"])
                .map(|k| EdgeKind::parse(&k))
                .unwrap_or(EdgeKind::Depends);
            Some(GraphEdge::new(from, to, kind))
        })
        .collect();

    GraphParts { nodes, edges }
}

fn from_records<'a>(records: impl Iterator<Item = &'a Value>) -> GraphParts {
    let mut parts = GraphParts::empty();
    let mut seen = HashSet::new();

    for record in records.filter_map(Value::as_object) {
        let Some(id) = text_field(record, &["id", "name", "path"]) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let path = text_field(record, &["path"]).unwrap_or_default();
        let declared = text_field(record, &["category", "type"]).unwrap_or_else(|| "other".to_string());

        for target in string_list(record, &["dependencies", "deps"]) {
            parts.edges.push(GraphEdge::new(id.clone(), target, EdgeKind::Depends));
        }

        parts.nodes.push(GraphNode {
            label: text_field(record, &["label", "name"]).unwrap_or_else(|| id.clone()),
            entity_type: text_field(record, &["type"]).unwrap_or_else(|| "unknown".to_string()),
            category: detect_category(&declared, &path),
            lifecycle: text_field(record, &["lifecycle"])
                .map(|l| Lifecycle::parse(&l))
                .unwrap_or_default(),
            id,
            path,
        });
    }

    parts
}

/// First non-empty string (or number) among `keys`.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First array among `keys`, keeping only its string items.
fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
