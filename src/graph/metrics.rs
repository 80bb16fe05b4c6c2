//! Whole-graph statistics for the HTML stats panel.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

use super::types::GraphData;

/// How many of the best-connected nodes to report.
pub const TOP_CONNECTED: usize = 5;

/// A node and its total (in + out) degree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeEntry {
    pub id: String,
    pub label: String,
    pub degree: usize,
}

/// Summary statistics over a graph snapshot.
///
/// Only edges whose endpoints are both present nodes are counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    /// `2E / (V(V-1))`, zero for fewer than two nodes.
    pub density: f64,
    /// `2E / V`, zero for an empty graph.
    pub avg_degree: f64,
    pub top_connected: Vec<DegreeEntry>,
}

impl GraphMetrics {
    pub fn compute(data: &GraphData) -> Self {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(data.nodes.len());

        for (pos, node) in data.nodes.iter().enumerate() {
            index
                .entry(node.id.as_str())
                .or_insert_with(|| graph.add_node(pos));
        }
        for edge in &data.edges {
            if let (Some(&from), Some(&to)) =
                (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            {
                graph.add_edge(from, to, ());
            }
        }

        let v = graph.node_count();
        let e = graph.edge_count();
        let density = if v > 1 {
            (2 * e) as f64 / (v * (v - 1)) as f64
        } else {
            0.0
        };
        let avg_degree = if v > 0 { (2 * e) as f64 / v as f64 } else { 0.0 };

        let mut degrees: Vec<DegreeEntry> = graph
            .node_indices()
            .filter_map(|idx| {
                let degree = graph.edges_directed(idx, Direction::Outgoing).count()
                    + graph.edges_directed(idx, Direction::Incoming).count();
                if degree == 0 {
                    return None;
                }
                let node = &data.nodes[graph[idx]];
                Some(DegreeEntry {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    degree,
                })
            })
            .collect();
        degrees.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
        degrees.truncate(TOP_CONNECTED);

        Self {
            node_count: v,
            edge_count: e,
            density,
            avg_degree,
            top_connected: degrees,
        }
    }
}
