//! Export formatters: pure functions from the canonical graph to text.

pub mod dot;
pub mod html;
pub mod json;
pub mod mermaid;

use std::fmt;
use std::str::FromStr;

use crate::error::{GraphError, Result};
use crate::graph::GraphData;
use crate::render::{render_tree, TreeOptions};

pub use dot::{escape_dot, format_dot};
pub use html::{escape_html, format_html, HtmlOptions, HtmlPayload};
pub use json::format_json;
pub use mermaid::{escape_mermaid, format_mermaid, safe_id};

/// Output format for `--deps`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    #[default]
    Ascii,
    Json,
    Dot,
    Mermaid,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Ascii,
        ExportFormat::Json,
        ExportFormat::Dot,
        ExportFormat::Mermaid,
        ExportFormat::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Ascii => "ascii",
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::Mermaid => "mermaid",
            ExportFormat::Html => "html",
        }
    }

    pub fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(ExportFormat::as_str).collect()
    }

    /// The format actually written in watch mode: DOT unless a file format
    /// with its own artifact was asked for.
    pub fn for_watch(self) -> ExportFormat {
        match self {
            ExportFormat::Mermaid | ExportFormat::Html => self,
            _ => ExportFormat::Dot,
        }
    }

    /// Artifact file name used in watch mode.
    pub fn artifact_name(self) -> &'static str {
        match self.for_watch() {
            ExportFormat::Mermaid => "graph.mmd",
            ExportFormat::Html => "graph.html",
            _ => "graph.dot",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| GraphError::UnknownFormat(s.to_string()))
    }
}

/// Render a graph in any export format. ASCII is the plain-glyph tree.
pub fn format_graph(data: &GraphData, format: ExportFormat, html: &HtmlOptions) -> Result<String> {
    match format {
        ExportFormat::Ascii => Ok(render_tree(data, &TreeOptions::for_terminal(false))),
        ExportFormat::Json => format_json(data),
        ExportFormat::Dot => Ok(format_dot(data)),
        ExportFormat::Mermaid => Ok(format_mermaid(data)),
        ExportFormat::Html => format_html(data, html),
    }
}
