//! JSON output: the canonical envelope, pretty-printed.

use crate::error::Result;
use crate::graph::GraphData;

pub fn format_json(data: &GraphData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphEdge, GraphNode, GraphParts, Lifecycle, SourceKind};

    #[test]
    fn test_parse_gives_back_the_envelope() {
        let data = GraphData::wrap(
            GraphParts {
                nodes: vec![
                    GraphNode::new("dev", "agent", "agents/dev.md", "agents"),
                    GraphNode::new("old", "task", "tasks/old.md", "tasks")
                        .with_label("Old \"task\"")
                        .with_lifecycle(Lifecycle::Deprecated),
                ],
                edges: vec![GraphEdge::new("dev", "old", EdgeKind::Uses)],
            },
            SourceKind::Registry,
            1_700_000_000_000,
        );
        let text = format_json(&data).unwrap();
        assert!(text.contains("\n  \"nodes\": ["));
        let back: GraphData = serde_json::from_str(&text).unwrap();
        assert_eq!(back, data);
    }
}
