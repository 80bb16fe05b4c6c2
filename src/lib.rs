//! # aios-graph
//!
//! Dependency dashboard for a project's internal entities (agents, tasks,
//! templates, scripts, ...).
//!
//! The graph comes from a live analysis provider when one is available and
//! from the static entity registry otherwise. Either way it is normalized into
//! one envelope and rendered as a terminal tree, a stats panel, a provider
//! status panel, JSON, Graphviz DOT, Mermaid or an interactive HTML page.
//!
//! ## Key Features
//!
//! - **Never fails upward**: sources degrade into fallback envelopes
//! - **Cached**: every source memoizes its envelope for a short TTL
//! - **Live**: watch mode rewrites an artifact on a timer and on registry edits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aios_graph::{get_graph_data, Dashboard};
//!
//! # async fn demo() {
//! let dashboard = Dashboard::open(".");
//! let graph = get_graph_data(&dashboard).await;
//! println!("{} entities, fallback: {}", graph.nodes.len(), graph.is_fallback);
//! # }
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod graph;
pub mod render;
pub mod source;
pub mod watcher;

// Re-exports for convenience
pub use config::DashboardConfig;
pub use dashboard::{get_graph_data, Dashboard};
pub use error::{GraphError, Result};

// Graph model
pub use graph::{
    EdgeKind, GraphData, GraphEdge, GraphMetrics, GraphNode, Lifecycle, Registry, SourceKind,
};

// Sources and formats
pub use export::ExportFormat;
pub use source::{
    AnalysisProvider, EntityStats, GraphSource, MetricsSource, ProviderMetrics, Source,
    StatsSource,
};
pub use watcher::{WatchSession, WatchState};
