//! Terminal renderers.
//!
//! Pure functions from an envelope to display text. Each takes a TTY
//! toggle: on a terminal they use ANSI colour and Unicode glyphs, otherwise
//! plain ASCII.

pub mod ansi;
pub mod stats;
pub mod status;
pub mod tree;

pub use stats::{render_stats, sparkline, time_ago, StatsOptions, MAX_LATENCY_POINTS};
pub use status::{render_status, CB_FAILURE_THRESHOLD};
pub use tree::{render_tree, TreeOptions, MAX_ITEMS_PER_BRANCH};
