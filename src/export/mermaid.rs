//! Mermaid flowchart output.

use std::collections::HashSet;

use crate::graph::GraphData;

/// Reduce an id to Mermaid's bare-identifier alphabet `[A-Za-z0-9_-]`.
pub fn safe_id(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Neutralize the characters that end a `["..."]` label.
pub fn escape_mermaid(raw: &str) -> String {
    raw.replace('"', "&quot;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
}

/// One line per edge, then one line per node with no incident edge.
pub fn format_mermaid(data: &GraphData) -> String {
    let mut lines = vec!["graph TD".to_string()];
    let mut connected: HashSet<&str> = HashSet::new();

    for edge in &data.edges {
        lines.push(format!(
            "  {}[\"{}\"] --> {}[\"{}\"]",
            safe_id(&edge.from),
            escape_mermaid(&edge.from),
            safe_id(&edge.to),
            escape_mermaid(&edge.to)
        ));
        connected.insert(&edge.from);
        connected.insert(&edge.to);
    }

    for node in data.nodes.iter().filter(|n| !connected.contains(n.id.as_str())) {
        let label = if node.label.is_empty() { &node.id } else { &node.label };
        lines.push(format!("  {}[\"{}\"]", safe_id(&node.id), escape_mermaid(label)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphEdge, GraphNode, GraphParts, SourceKind};

    #[test]
    fn test_edges_then_isolated_nodes() {
        let data = GraphData::wrap(
            GraphParts {
                nodes: vec![
                    GraphNode::new("dev", "agent", "", "agents"),
                    GraphNode::new("task-a", "task", "", "tasks"),
                    GraphNode::new("lonely", "task", "", "tasks").with_label("Lonely [x]"),
                ],
                edges: vec![GraphEdge::new("dev", "task-a", EdgeKind::Depends)],
            },
            SourceKind::Live,
            0,
        );
        assert_eq!(
            format_mermaid(&data),
            "graph TD\n  dev[\"dev\"] --> task-a[\"task-a\"]\n  lonely[\"Lonely &#91;x&#93;\"]"
        );
    }

    #[test]
    fn test_ids_are_sanitized() {
        let data = GraphData::wrap(
            GraphParts {
                nodes: vec![],
                edges: vec![GraphEdge::new("core/utils.js", "a \"b\"", EdgeKind::Uses)],
            },
            SourceKind::Live,
            0,
        );
        let out = format_mermaid(&data);
        assert!(out.contains("core_utils_js[\"core/utils.js\"] --> a__b_[\"a &quot;b&quot;\"]"));

        for line in out.lines().skip(1) {
            let id: String = line.trim_start().chars().take_while(|c| *c != '[').collect();
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
    }

    #[test]
    fn test_empty_id_gets_placeholder() {
        assert_eq!(safe_id(""), "_");
        assert_eq!(safe_id("a.b"), "a_b");
    }
}
