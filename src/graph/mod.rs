//! Entity graph module: the canonical data model and the adapters that
//! produce it from live-provider output or the static registry.

pub mod category;
pub mod metrics;
pub mod normalize;
pub mod registry;
pub mod types;

pub use category::{classify_script, detect_category};
pub use metrics::{DegreeEntry, GraphMetrics};
pub use normalize::normalize_dependencies;
pub use registry::{
    registry_to_graph, Registry, RegistryCategory, RegistryEntry, RegistryLoader,
    RegistryMetadata, YamlRegistryLoader,
};
pub use types::{EdgeKind, GraphData, GraphEdge, GraphNode, GraphParts, Lifecycle, SourceKind};
