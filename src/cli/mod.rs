//! Command grammar and dispatch for `aios-graph`.
//!
//! Commands:
//! - (none): summary view, compact tree + stats + provider status
//! - `--deps`: dependency tree or an export format, optionally in watch mode
//! - `--stats`: entity statistics and cache metrics
//! - `--help`, `-h`

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::dashboard::Dashboard;
use crate::error::{GraphError, Result};
use crate::export::{format_graph, format_html, ExportFormat, HtmlOptions};
use crate::graph::GraphData;
use crate::render::{render_stats, render_status, render_tree, StatsOptions, TreeOptions};
use crate::source::Source;
use crate::watcher::{ArtifactWriter, WatchConfig, WatchSession};

pub const HELP_TEXT: &str = "\
Usage: aios-graph [command] [options]

Commands:
  --deps          Show dependency tree as ASCII text
  --stats         Show entity statistics and cache metrics
  --help, -h      Show this help message

Options:
  --format=FORMAT Output format: ascii (default), json, dot, mermaid, html
  --watch         Live mode: regenerate graph file on interval
  --interval=N    Seconds between regeneration in watch mode (default: 5)

Examples:
  aios-graph --deps                        Show dependency tree
  aios-graph --deps --format=json          Output as JSON
  aios-graph --deps --format=html          Interactive HTML graph (opens browser)
  aios-graph --deps --watch                Live DOT file for VS Code preview
  aios-graph --deps --watch --format=html  Live HTML with auto-refresh
  aios-graph --deps --watch --format=mermaid  Live Mermaid file
  aios-graph --deps --watch --interval=10  Refresh every 10 seconds
  aios-graph --stats                       Show entity stats and cache metrics";

const SUMMARY_TITLE: &str = "AIOS Graph Dashboard";
const SUMMARY_RULE_WIDTH: usize = 35;

/// Parsed command line. `format` stays raw until `--deps` validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Option<String>,
    pub format: String,
    /// `None` when absent, zero or not a number.
    pub interval: Option<u64>,
    pub watch: bool,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: None,
            format: ExportFormat::Ascii.to_string(),
            interval: None,
            watch: false,
            help: false,
        }
    }
}

/// Parse raw arguments. Never fails: unknown input is reported at dispatch.
///
/// The first unrecognised `--flag` becomes the command, so a typo such as
/// `--dpes` surfaces as an unknown command rather than being ignored.
pub fn parse_args<S: AsRef<str>>(argv: &[S]) -> CliArgs {
    let mut args = CliArgs::default();
    let mut iter = argv.iter().map(|s| -> &str { s.as_ref() }).peekable();

    while let Some(arg) = iter.next() {
        let has_value = iter.peek().is_some();
        match arg {
            "--help" | "-h" => {
                args.help = true;
                args.command = Some("--help".to_string());
            }
            "--deps" | "--stats" => args.command = Some(arg.to_string()),
            "--watch" => args.watch = true,
            "--format" if has_value => {
                if let Some(value) = iter.next() {
                    args.format = value.to_string();
                }
            }
            "--interval" if has_value => {
                args.interval = iter.next().and_then(parse_interval);
            }
            _ => {
                if let Some(value) = arg.strip_prefix("--format=") {
                    args.format = value.split('=').next().unwrap_or_default().to_string();
                } else if let Some(value) = arg.strip_prefix("--interval=") {
                    args.interval = parse_interval(value);
                } else if arg.starts_with("--") && args.command.is_none() {
                    args.command = Some(arg.to_string());
                }
            }
        }
    }

    args
}

fn parse_interval(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

/// Properties of the process the command runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal {
    /// Stdout is a terminal: colour and Unicode glyphs.
    pub tty: bool,
    /// Launch the default browser after writing an HTML page.
    pub open_browser: bool,
}

/// What the caller still has to do after [`run`] returns.
pub enum RunOutcome {
    Done,
    /// Watch mode is live; the caller owns shutdown.
    Watching(WatchSession),
}

/// Dispatch a parsed command line. Usage errors come back as
/// [`GraphError::UnknownCommand`] / [`GraphError::UnknownFormat`].
pub async fn run<W: Write>(
    args: &CliArgs,
    dashboard: &Dashboard,
    term: Terminal,
    out: &mut W,
) -> Result<RunOutcome> {
    if args.help {
        writeln!(out, "{}", HELP_TEXT)?;
        return Ok(RunOutcome::Done);
    }

    match args.command.as_deref() {
        None => summary(dashboard, term, out).await?,
        Some("--deps") => return deps(args, dashboard, term, out).await,
        Some("--stats") => stats(dashboard, term, out).await?,
        Some(other) => return Err(GraphError::UnknownCommand(other.to_string())),
    }
    Ok(RunOutcome::Done)
}

async fn deps<W: Write>(
    args: &CliArgs,
    dashboard: &Dashboard,
    term: Terminal,
    out: &mut W,
) -> Result<RunOutcome> {
    let format: ExportFormat = args.format.parse()?;

    if args.watch {
        return Ok(RunOutcome::Watching(watch(args, format, dashboard).await?));
    }

    let data = dashboard.graph_source().get_data().await;
    match format {
        ExportFormat::Ascii => {
            writeln!(out, "{}", render_tree(&data, &TreeOptions::for_terminal(term.tty)))?
        }
        ExportFormat::Html => {
            let path = write_html(&data, dashboard.config().output_dir.as_path(), out)?;
            if term.open_browser && !open_in_browser(&path).await {
                writeln!(
                    out,
                    "Could not open browser automatically. Open manually: {}",
                    path.display()
                )?;
            }
        }
        other => writeln!(out, "{}", format_graph(&data, other, &HtmlOptions::default())?)?,
    }
    Ok(RunOutcome::Done)
}

async fn stats<W: Write>(dashboard: &Dashboard, term: Terminal, out: &mut W) -> Result<()> {
    let mut registry = dashboard.stats_source();
    let mut provider = dashboard.metrics_source();
    let (entity_stats, metrics) = tokio::join!(registry.get_data(), provider.get_data());

    let opts = StatsOptions {
        tty: term.tty,
        now_ms: dashboard.clock().now_ms(),
    };
    writeln!(out, "{}", render_stats(&entity_stats, &metrics, &opts))?;
    Ok(())
}

async fn summary<W: Write>(dashboard: &Dashboard, term: Terminal, out: &mut W) -> Result<()> {
    let mut graph = dashboard.graph_source();
    let mut registry = dashboard.stats_source();
    let mut provider = dashboard.metrics_source();
    let (data, entity_stats, metrics) =
        tokio::join!(graph.get_data(), registry.get_data(), provider.get_data());

    let rule = if term.tty { "═" } else { "=" };
    let tree_opts =
        TreeOptions::for_terminal(term.tty).compact(dashboard.config().summary_per_category);
    let stats_opts = StatsOptions {
        tty: term.tty,
        now_ms: dashboard.clock().now_ms(),
    };

    let sections = [
        SUMMARY_TITLE.to_string(),
        rule.repeat(SUMMARY_RULE_WIDTH),
        String::new(),
        render_tree(&data, &tree_opts),
        String::new(),
        render_stats(&entity_stats, &metrics, &stats_opts),
        String::new(),
        render_status(&metrics, term.tty),
    ];
    writeln!(out, "{}", sections.join("\n"))?;
    Ok(())
}

/// Write `<output_dir>/graph.html` and report it. Returns the written path.
fn write_html<W: Write>(data: &GraphData, output_dir: &Path, out: &mut W) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(ExportFormat::Html.artifact_name());
    std::fs::write(&path, format_html(data, &HtmlOptions::default())?)?;
    writeln!(
        out,
        "HTML graph written to {} ({} entities)",
        path.display(),
        data.nodes.len()
    )?;
    Ok(path)
}

/// Hand a file to the platform's default opener. False if that failed.
async fn open_in_browser(path: &Path) -> bool {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else {
        tokio::process::Command::new("xdg-open")
    };

    match cmd.arg(path).status().await {
        Ok(status) => status.success(),
        Err(e) => {
            debug!(error = %e, "browser launcher failed");
            false
        }
    }
}

async fn watch(args: &CliArgs, format: ExportFormat, dashboard: &Dashboard) -> Result<WatchSession> {
    let config = dashboard.config();
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let html = HtmlOptions {
        auto_refresh: Some(config.html_refresh_secs),
    };
    let writer = ArtifactWriter::new(dashboard.graph_source(), format, html, &config.output_dir);
    info!(path = %writer.path().display(), "watching graph artifact");

    let interval = args.interval.unwrap_or(config.watch_interval_secs);
    let mut watch_config = WatchConfig::new(Duration::from_secs(interval), config.debounce());
    if let Some(registry) = dashboard.registry_file().filter(|p| p.exists()) {
        watch_config = watch_config.watching(registry);
    }

    Ok(WatchSession::start(writer, watch_config).await)
}
