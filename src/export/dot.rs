//! Graphviz DOT output.

use crate::graph::GraphData;

/// Escape a string for a double-quoted DOT id or label.
pub fn escape_dot(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the graph as a `digraph`. Valid input for `dot -Tpng`.
pub fn format_dot(data: &GraphData) -> String {
    let mut lines = vec![
        "digraph G {".to_string(),
        "  rankdir=TB;".to_string(),
        "  node [shape=box, style=rounded];".to_string(),
    ];

    for node in &data.nodes {
        let label = if node.label.is_empty() { &node.id } else { &node.label };
        lines.push(format!(
            "  \"{}\" [label=\"{}\"];",
            escape_dot(&node.id),
            escape_dot(label)
        ));
    }
    for edge in &data.edges {
        lines.push(format!(
            "  \"{}\" -> \"{}\";",
            escape_dot(&edge.from),
            escape_dot(&edge.to)
        ));
    }

    lines.push("}".to_string());
    lines.join("\n")
}
