//! Dependency tree, grouped by category.

use std::collections::{BTreeMap, HashMap};

use super::ansi::{paint, YELLOW};
use crate::graph::{EdgeKind, GraphData, GraphNode};

/// Items shown per category before truncating with `... (N more)`.
pub const MAX_ITEMS_PER_BRANCH: usize = 20;

/// Branch glyphs for one character set.
#[derive(Debug, Clone, Copy)]
pub struct TreeGlyphs {
    pub branch: &'static str,
    pub last: &'static str,
    pub pipe: &'static str,
    pub space: &'static str,
}

pub const UNICODE_GLYPHS: TreeGlyphs = TreeGlyphs {
    branch: "├─",
    last: "└─",
    pipe: "│",
    space: " ",
};

pub const ASCII_GLYPHS: TreeGlyphs = TreeGlyphs {
    branch: "+-",
    last: "\\-",
    pipe: "|",
    space: " ",
};

#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    pub unicode: bool,
    pub color: bool,
    /// Per-category cap for compact views. Defaults to [`MAX_ITEMS_PER_BRANCH`].
    pub max_per_category: Option<usize>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            unicode: true,
            color: false,
            max_per_category: None,
        }
    }
}

impl TreeOptions {
    pub fn for_terminal(tty: bool) -> Self {
        Self {
            unicode: tty,
            color: tty,
            max_per_category: None,
        }
    }

    pub fn compact(mut self, per_category: usize) -> Self {
        self.max_per_category = Some(per_category);
        self
    }

    fn glyphs(&self) -> TreeGlyphs {
        if self.unicode {
            UNICODE_GLYPHS
        } else {
            ASCII_GLYPHS
        }
    }
}

/// Render a graph snapshot as a category tree.
pub fn render_tree(data: &GraphData, opts: &TreeOptions) -> String {
    let glyphs = opts.glyphs();
    let badge = if data.is_fallback {
        format!(" {}", paint("[OFFLINE]", YELLOW, opts.color))
    } else {
        String::new()
    };

    if data.nodes.is_empty() {
        return format!("Dependency Graph (0 entities){badge}\n(empty)");
    }

    let mut depends: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in data.edges.iter().filter(|e| e.kind == EdgeKind::Depends) {
        depends.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }

    let mut categories: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    for node in &data.nodes {
        let category = if node.category.is_empty() { "other" } else { node.category.as_str() };
        categories.entry(category).or_default().push(node);
    }

    let cap = opts.max_per_category.unwrap_or(MAX_ITEMS_PER_BRANCH);
    let mut lines = vec![format!("Dependency Graph ({} entities){badge}", data.nodes.len())];

    let category_count = categories.len();
    for (ci, (name, mut nodes)) in categories.into_iter().enumerate() {
        let last_category = ci + 1 == category_count;
        let (prefix, cont) = if last_category {
            (glyphs.last, glyphs.space)
        } else {
            (glyphs.branch, glyphs.pipe)
        };
        lines.push(format!("{prefix} {name}/ ({})", nodes.len()));

        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let shown = nodes.len().min(cap);
        let has_more = nodes.len() > cap;

        for (ni, node) in nodes.iter().take(shown).enumerate() {
            let node_prefix = if ni + 1 == shown && !has_more {
                glyphs.last
            } else {
                glyphs.branch
            };
            let suffix = match depends.get(node.id.as_str()) {
                Some(deps) if !deps.is_empty() => {
                    format!(" {} depends: {}", glyphs.last, deps.join(", "))
                }
                _ => String::new(),
            };
            lines.push(format!("{cont}  {node_prefix} {}{suffix}", node.id));
        }

        if has_more {
            lines.push(format!(
                "{cont}  {} ... ({} more)",
                glyphs.last,
                nodes.len() - cap
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphParts, SourceKind};

    fn sample(is_fallback: bool) -> GraphData {
        let source = if is_fallback { SourceKind::Registry } else { SourceKind::Live };
        GraphData::wrap(
            GraphParts {
                nodes: vec![
                    GraphNode::new("task-b", "task", "", "tasks"),
                    GraphNode::new("dev", "agent", "", "agents"),
                    GraphNode::new("task-a", "task", "", "tasks"),
                ],
                edges: vec![
                    GraphEdge::new("dev", "task-a", EdgeKind::Depends),
                    GraphEdge::new("dev", "task-b", EdgeKind::Depends),
                    GraphEdge::new("task-a", "dev", EdgeKind::Uses),
                ],
            },
            source,
            0,
        )
    }

    #[test]
    fn test_empty_fallback_graph() {
        let out = render_tree(&GraphData::empty_fallback(0), &TreeOptions::default());
        assert!(out.contains("0 entities"));
        assert!(out.contains("(empty)"));
        assert!(out.contains("[OFFLINE]"));
    }

    #[test]
    fn test_empty_live_graph_has_no_badge() {
        let data = GraphData::wrap(GraphParts::empty(), SourceKind::Live, 0);
        assert_eq!(
            render_tree(&data, &TreeOptions::default()),
            "Dependency Graph (0 entities)\n(empty)"
        );
    }

    #[test]
    fn test_unicode_tree_layout() {
        let out = render_tree(&sample(false), &TreeOptions::default());
        let expected = "\
Dependency Graph (3 entities)
├─ agents/ (1)
│  └─ dev └─ depends: task-a, task-b
└─ tasks/ (2)
   ├─ task-a
   └─ task-b";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_ascii_tree_with_badge() {
        let opts = TreeOptions::for_terminal(false);
        let out = render_tree(&sample(true), &opts);
        assert!(out.starts_with("Dependency Graph (3 entities) [OFFLINE]\n+- agents/ (1)\n"));
        assert!(out.contains("|  \\- dev \\- depends: task-a, task-b"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_branch_truncation() {
        let nodes = (0..25)
            .map(|i| GraphNode::new(format!("t{i:02}"), "task", "", "tasks"))
            .collect();
        let data = GraphData::wrap(GraphParts { nodes, edges: vec![] }, SourceKind::Live, 0);

        let out = render_tree(&data, &TreeOptions::default());
        assert!(out.contains("t19"));
        assert!(!out.contains("t20"));
        assert!(out.ends_with("└─ ... (5 more)"));

        let compact = render_tree(&data, &TreeOptions::default().compact(5));
        assert_eq!(compact.lines().count(), 1 + 1 + 5 + 1);
        assert!(compact.ends_with("... (20 more)"));
    }
}
