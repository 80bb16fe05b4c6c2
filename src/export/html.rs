//! Interactive HTML view.
//!
//! The page is a thin shell: a styled node/edge payload embedded as JSON,
//! plus the static viewer in `assets/graph-view.js` that renders it with
//! vis-network. Every label and path is HTML-escaped before it reaches the
//! payload or the markup.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::Result;
use crate::graph::{GraphData, GraphMetrics, Lifecycle};

const VIS_NETWORK_CDN: &str = "https://unpkg.com/vis-network/standalone/umd/vis-network.min.js";
const VIEWER_JS: &str = include_str!("../../assets/graph-view.js");
const VIEWER_CSS: &str = include_str!("../../assets/graph-view.css");

const BORDER_SUBTLE: &str = "rgba(255,255,255,0.04)";
const BORDER_GOLD: &str = "rgba(201,178,152,0.25)";
const BORDER_GOLD_STRONG: &str = "rgba(201,178,152,0.5)";
const TEXT_TERTIARY: &str = "#8A8A7F";
const TEXT_MUTED: &str = "#6B6B63";

/// Colour and vis-network shape for a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStyle {
    pub color: &'static str,
    pub shape: &'static str,
}

/// Known categories, in sidebar order.
pub const CATEGORY_STYLES: [(&str, CategoryStyle); 11] = [
    ("agents", CategoryStyle { color: "#22c55e", shape: "dot" }),
    ("tasks", CategoryStyle { color: "#60A5FA", shape: "box" }),
    ("templates", CategoryStyle { color: "#FBBF24", shape: "diamond" }),
    ("checklists", CategoryStyle { color: "#f97316", shape: "triangle" }),
    ("workflows", CategoryStyle { color: "#f472b6", shape: "star" }),
    ("scripts/task", CategoryStyle { color: "#4ADE80", shape: "box" }),
    ("scripts/engine", CategoryStyle { color: "#ec4899", shape: "box" }),
    ("scripts/infra", CategoryStyle { color: "#06b6d4", shape: "box" }),
    ("utils", CategoryStyle { color: "#06b6d4", shape: "ellipse" }),
    ("data", CategoryStyle { color: "#eab308", shape: "database" }),
    ("tools", CategoryStyle { color: "#8b5cf6", shape: "hexagon" }),
];

pub const DEFAULT_STYLE: CategoryStyle = CategoryStyle {
    color: TEXT_TERTIARY,
    shape: "box",
};

/// Style for a (lower-cased) category. Bare `scripts` styles as `scripts/task`.
pub fn category_style(category: &str) -> CategoryStyle {
    let lookup = |name: &str| {
        CATEGORY_STYLES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, style)| *style)
    };
    lookup(category)
        .or_else(|| (category == "scripts").then(|| lookup("scripts/task")).flatten())
        .unwrap_or(DEFAULT_STYLE)
}

/// Border dash pattern: `false` for solid, `[dash, gap]` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BorderDashes {
    Solid(bool),
    Pattern([u8; 2]),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleStyle {
    pub opacity: f64,
    pub border_dashes: BorderDashes,
    pub color_override: Option<&'static str>,
}

pub fn lifecycle_style(lifecycle: Lifecycle) -> LifecycleStyle {
    match lifecycle {
        Lifecycle::Production => LifecycleStyle {
            opacity: 1.0,
            border_dashes: BorderDashes::Solid(false),
            color_override: None,
        },
        Lifecycle::Experimental => LifecycleStyle {
            opacity: 0.8,
            border_dashes: BorderDashes::Pattern([5, 5]),
            color_override: None,
        },
        Lifecycle::Deprecated => LifecycleStyle {
            opacity: 0.5,
            border_dashes: BorderDashes::Solid(false),
            color_override: Some(TEXT_TERTIARY),
        },
        Lifecycle::Orphan => LifecycleStyle {
            opacity: 0.3,
            border_dashes: BorderDashes::Pattern([2, 4]),
            color_override: Some(TEXT_MUTED),
        },
    }
}

/// Entity-escape `& < > " '` for safe embedding in markup or script.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorPair {
    pub background: &'static str,
    pub border: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeColor {
    pub background: &'static str,
    pub border: &'static str,
    pub highlight: ColorPair,
    pub hover: ColorPair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProperties {
    pub border_dashes: BorderDashes,
}

/// A node as the viewer consumes it. `label` and `path` are pre-escaped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisNode {
    pub id: String,
    pub label: String,
    pub group: String,
    pub lifecycle: Lifecycle,
    pub path: String,
    pub color: NodeColor,
    pub opacity: f64,
    pub shape_properties: ShapeProperties,
    pub shape: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub arrows: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub name: &'static str,
    #[serde(flatten)]
    pub style: CategoryStyle,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleSummary {
    pub name: Lifecycle,
    pub opacity: f64,
}

/// Everything the viewer needs, serialized into the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlPayload {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    pub categories: Vec<CategorySummary>,
    pub lifecycles: Vec<LifecycleSummary>,
    pub is_fallback: bool,
}

impl HtmlPayload {
    pub fn build(data: &GraphData) -> Self {
        let mut seen = HashSet::new();
        let nodes: Vec<VisNode> = data
            .nodes
            .iter()
            .filter(|n| seen.insert(n.id.as_str()))
            .map(|node| {
                let group = node.category.to_lowercase();
                let style = category_style(&group);
                let lc = lifecycle_style(node.lifecycle);
                let fill = lc.color_override.unwrap_or(style.color);
                let label = if node.label.is_empty() { &node.id } else { &node.label };
                VisNode {
                    id: node.id.clone(),
                    label: escape_html(label),
                    group,
                    lifecycle: node.lifecycle,
                    path: escape_html(&node.path),
                    color: NodeColor {
                        background: fill,
                        border: BORDER_SUBTLE,
                        highlight: ColorPair {
                            background: fill,
                            border: BORDER_GOLD_STRONG,
                        },
                        hover: ColorPair {
                            background: fill,
                            border: BORDER_GOLD,
                        },
                    },
                    opacity: lc.opacity,
                    shape_properties: ShapeProperties {
                        border_dashes: lc.border_dashes,
                    },
                    shape: style.shape,
                }
            })
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for node in &nodes {
            *counts.entry(node.group.as_str()).or_default() += 1;
        }
        let categories = CATEGORY_STYLES
            .iter()
            .map(|(name, style)| CategorySummary {
                name: *name,
                style: *style,
                count: counts.get(name).copied().unwrap_or(0),
            })
            .collect();

        let lifecycles = Lifecycle::ALL
            .iter()
            .map(|l| LifecycleSummary {
                name: *l,
                opacity: lifecycle_style(*l).opacity,
            })
            .collect();

        Self {
            edges: data
                .edges
                .iter()
                .map(|e| VisEdge {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    arrows: "to",
                })
                .collect(),
            nodes,
            categories,
            lifecycles,
            is_fallback: data.is_fallback,
        }
    }
}

/// Serialize for an inline `<script>`: `<`, `>` and `&` never appear raw, so
/// no string content can close the script element.
pub fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlOptions {
    /// Seconds between browser reloads (watch mode). `None` disables.
    pub auto_refresh: Option<u64>,
}

/// Render a self-contained HTML page for the graph.
pub fn format_html(data: &GraphData, opts: &HtmlOptions) -> Result<String> {
    let payload = HtmlPayload::build(data);
    let metrics = GraphMetrics::compute(data);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n");
    html.push_str("  <title>AIOS Graph Dashboard</title>\n");
    if let Some(secs) = opts.auto_refresh {
        let _ = writeln!(html, "  <meta http-equiv=\"refresh\" content=\"{secs}\">");
    }
    let _ = writeln!(html, "  <script src=\"{VIS_NETWORK_CDN}\"></script>");
    let _ = writeln!(html, "  <style>\n{VIEWER_CSS}  </style>");
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(
        html,
        "  <div id=\"status\">Loading vis-network...{}</div>",
        if data.is_fallback { " [OFFLINE]" } else { "" }
    );
    html.push_str(&sidebar(&payload, &metrics));
    html.push_str("  <div id=\"node-tooltip\" role=\"tooltip\"></div>\n");
    html.push_str("  <div id=\"graph\"></div>\n");
    let _ = writeln!(
        html,
        "  <script id=\"graph-payload\" type=\"application/json\">{}</script>",
        script_json(&payload)?
    );
    let _ = writeln!(html, "  <script>\n{VIEWER_JS}  </script>");
    html.push_str("</body>\n</html>\n");

    Ok(html)
}

fn sidebar(payload: &HtmlPayload, metrics: &GraphMetrics) -> String {
    let mut s = String::new();
    s.push_str("  <div id=\"sidebar\">\n");
    s.push_str("    <input type=\"text\" id=\"search-input\" placeholder=\"Search entities...\" autocomplete=\"off\">\n");

    s.push_str("    <div class=\"section-title\">ENTITY TYPES</div>\n");
    for cat in &payload.categories {
        let _ = writeln!(
            s,
            "    <label class=\"filter-item\"><input type=\"checkbox\" data-filter=\"category\" value=\"{name}\" checked>\
<span class=\"status-dot\" style=\"color:{color}\"></span> {name} <span class=\"count\">{count}</span></label>",
            name = cat.name,
            color = cat.style.color,
            count = cat.count,
        );
    }

    s.push_str("    <div class=\"section-title\">LIFECYCLE</div>\n");
    for lc in &payload.lifecycles {
        let _ = writeln!(
            s,
            "    <label class=\"filter-item\"><input type=\"checkbox\" data-filter=\"lifecycle\" value=\"{name}\" checked>\
<span style=\"opacity:{opacity}\">&#9679;</span> {name}</label>",
            name = lc.name,
            opacity = lc.opacity,
        );
    }
    s.push_str("    <label class=\"filter-item\"><input type=\"checkbox\" id=\"hide-orphans\"> Hide Orphans</label>\n");

    s.push_str("    <div class=\"section-title\">STATISTICS</div>\n");
    let _ = writeln!(s, "    <div class=\"stat-row\">Total Nodes <span id=\"stat-nodes\">{}</span></div>", metrics.node_count);
    let _ = writeln!(s, "    <div class=\"stat-row\">Total Edges <span id=\"stat-edges\">{}</span></div>", metrics.edge_count);
    let _ = writeln!(s, "    <div class=\"stat-row\">Graph Density <span id=\"stat-density\">{:.2}</span></div>", metrics.density);
    let _ = writeln!(s, "    <div class=\"stat-row\">Avg Degree <span id=\"stat-avg-degree\">{:.1}</span></div>", metrics.avg_degree);
    s.push_str("    <div class=\"stat-label\">Top 5 Connected</div>\n    <div id=\"stat-top5\">\n");
    for entry in &metrics.top_connected {
        let _ = writeln!(
            s,
            "      <div class=\"top5-item\"><span class=\"top5-name\">{}</span><span class=\"top5-degree\">{}</span></div>",
            escape_html(&entry.label),
            entry.degree
        );
    }
    s.push_str("    </div>\n");
    s.push_str("    <button id=\"btn-reset\" class=\"action-btn\">Reset / Show All</button>\n");
    s.push_str("  </div>\n");
    s
}
