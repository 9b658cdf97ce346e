//! cachetrace - cache operation tracing for rendered pages
//!
//! cachetrace provides:
//! - A cache backend decorator that writes every get/set/delete into the page as a comment
//! - Recovery of those comments into per-element trace records
//! - A headless inspection overlay driven by hover/click/key events
//! - Unified output format (jsonl/json/md/raw)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod core;
mod dom;
mod overlay;
mod trace;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(&cli);

    if cli.no_color {
        colored::control::set_override(false);
    }

    cli::run(cli)
}

/// Log to stderr; stdout is reserved for results
fn init_logging(cli: &cli::Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
