//! aios-graph - entity dependency graph dashboard.
//!
//! Usage:
//!   aios-graph                            # Summary: tree + stats + status
//!   aios-graph --deps                     # Dependency tree
//!   aios-graph --deps --format=html       # Interactive HTML graph
//!   aios-graph --deps --watch             # Keep .aios/graph.dot fresh
//!   aios-graph --stats                    # Entity stats and cache metrics
//!   aios-graph --root ../project --deps   # Another project root

use std::io::IsTerminal;
use std::path::PathBuf;

use aios_graph::cli::{parse_args, run, RunOutcome, Terminal, HELP_TEXT};
use aios_graph::{Dashboard, GraphError};
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "aios-graph")]
#[command(about = "Entity dependency graph dashboard", long_about = None)]
#[command(disable_help_flag = true, override_usage = "aios-graph [--root <PATH>] [--verbose] [command] [options]")]
struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, env = "AIOS_GRAPH_ROOT", default_value = ".")]
    root: PathBuf,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    /// Dashboard command and options (see --help)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries the rendered output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.verbose { "info" } else { "warn" })
            }),
        )
        .init();

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    info!(root = %root.display(), "aios-graph starting");

    let dashboard = Dashboard::open(&root);
    let args = parse_args(&cli.args);
    let term = Terminal {
        tty: std::io::stdout().is_terminal(),
        open_browser: true,
    };

    match run(&args, &dashboard, term, &mut std::io::stdout()).await {
        Ok(RunOutcome::Done) => Ok(()),
        Ok(RunOutcome::Watching(mut session)) => {
            tokio::signal::ctrl_c().await?;
            session.cleanup();
            Ok(())
        }
        Err(e) if e.is_usage_error() => {
            eprintln!("{}", e);
            if matches!(e, GraphError::UnknownCommand(_)) {
                eprintln!("{}", HELP_TEXT);
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
