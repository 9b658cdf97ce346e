//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::render::{OutputFormat, RenderConfig};
use crate::overlay::state::DisplayMode;

/// cachetrace - trace cache operations into page markup and inspect them per element.
#[derive(Parser, Debug)]
#[command(name = "cachetrace")]
#[command(
    author,
    version,
    about,
    long_about = r##"cachetrace records cache get/set/delete calls as HTML comments in a rendered
page and recovers them per element, the way a page overlay would on hover.

Trace comments look like:
    <!-- CACHE_DEBUG:{"method":"get","cid":"node:5:[lang]=en","tags":null} -->

Reporting commands print a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into tools)
- json: a single JSON array
- md: human-friendly Markdown
- raw: excerpts only (summaries, panel text)

Examples:
    cachetrace trace render.json --out page.html
    cachetrace elements page.html
    cachetrace inspect page.html "#content" --format md
    cachetrace replay page.html --events "hover:article,click:GET,key:Escape"
    cachetrace lint captures/
"##
)]
pub struct Cli {
    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- raw\n\n\
Tip: Prefer jsonl when you want stable, line-oriented output for piping."
    )]
    pub format: String,

    /// Initial display mode (both/get/set/hidden).
    #[arg(
        long,
        global = true,
        env = "CACHETRACE_MODE",
        default_value = "both",
        value_name = "MODE",
        long_help = "Display mode the overlay starts in. It decides which panel rows are shown\n\
and is written to the page root as data-cache-trace-mode.\n\n\
Supported values:\n\
- both (default): all rows\n\
- get: get rows only\n\
- set: set rows only\n\
- hidden: no rows"
    )]
    pub mode: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors. Colors are only used for panel text in md output."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Only log errors to stderr. Machine-readable results are still printed\n\
to stdout."
    )]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log debug diagnostics to stderr: skipped trace comments, rebuilt\n\
elements, replayed events. RUST_LOG takes precedence when set."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
This is useful when manually inspecting results. Has no effect on md/raw formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a page by replaying a script through traced cache bins.
    #[command(
        long_about = r#"Replay a render script through traced in-memory cache bins and print the
resulting page. Every get/set/delete writes a trace comment into the page
right where it happens.

A script is a JSON array of steps:
    {"step": "markup", "html": "<body>"}
    {"step": "render", "bin": "render", "cid": "node:5:[lang]=en", "tags": ["node:5"], "html": "<article>..</article>"}
    {"step": "get" | "set" | "delete" | "invalidate" | "invalidate_tags" | "garbage_collection", ...}
    {"step": "get_multiple" | "set_multiple" | "delete_multiple" | "delete_all", ...}
    {"step": "invalidate_multiple" | "invalidate_all" | "remove_bin", ...}

A render step reads the cid and, on a miss, stores the markup before writing it.
Only single get/set/delete operations are traced; bulk steps run untraced.

Examples:
    cachetrace trace render.json
    cachetrace trace render.json --out page.html
"#
    )]
    Trace {
        /// Render script (JSON).
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Write the page to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the page with trace summaries written as attributes.
    #[command(
        long_about = "Initialize the overlay on a page and print the page with\n\
data-cache-trace on every traced element and data-cache-trace-mode on the page root.\n\n\
Examples:\n\
  cachetrace annotate page.html\n\
  cachetrace annotate page.html --mode get --out annotated.html\n"
    )]
    Annotate {
        /// Page file.
        #[arg(value_name = "PAGE")]
        page: PathBuf,

        /// Write the page to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// List traced elements with their summaries.
    #[command(
        long_about = "Emit one Element result item per traced element, in document order: the\n\
element path, source line, key summary, record count and a digest of the records.\n\n\
PAGE may be a directory; every .html/.htm/.xhtml file beneath it is read.\n\n\
Examples:\n\
  cachetrace elements page.html\n\
  cachetrace elements captures/ --format md\n"
    )]
    Elements {
        /// Page file or directory of pages.
        #[arg(value_name = "PAGE")]
        page: PathBuf,
    },

    /// Hover an element and show its inspection panel.
    #[command(
        long_about = "Hover the first element matching SELECTOR and emit the panel built from the\n\
nearest traced element at or above it.\n\n\
Selectors: tag, #id, .class, tag#id, tag.class, or @N (N-th element, 0-based).\n\n\
Examples:\n\
  cachetrace inspect page.html article\n\
  cachetrace inspect page.html \"#content\" --mode set --format md\n"
    )]
    Inspect {
        /// Page file.
        #[arg(value_name = "PAGE")]
        page: PathBuf,

        /// Element selector.
        #[arg(value_name = "SELECTOR")]
        selector: String,
    },

    /// Dispatch a sequence of overlay events and snapshot the state after each.
    #[command(
        long_about = r#"Dispatch events to the overlay in order and emit one Snapshot result item
after each: display mode, panel status, key listener, inspected element and
visible rows.

Events (comma-separated):
- hover:<selector>   mouse enters the selected element
- click:<LABEL>      control bar click (BOTH, GET, SET, hide)
- key:<Key>          key-up (Escape closes the panel)

The list is split on every comma, so a selector cannot contain one.

Example:
    cachetrace replay page.html --events "hover:#n5,click:SET,key:Escape,hover:#n5"
"#
    )]
    Replay {
        /// Page file.
        #[arg(value_name = "PAGE")]
        page: PathBuf,

        /// Comma-separated event list (selectors cannot contain commas).
        #[arg(long, value_name = "LIST")]
        events: String,
    },

    /// Check pages for broken trace comments.
    #[command(
        long_about = "Lint trace comments in a page (or every page under a directory):\n\
- MALFORMED_TRACE: marker present but the JSON does not decode\n\
- UNSUPPORTED_VERSION: written with a newer wire version\n\
- EMPTY_KEYS: traced element with records whose cid has no keys\n\n\
Issues are emitted as Issue result items.\n\n\
Examples:\n\
  cachetrace lint page.html\n\
  cachetrace lint captures/ --format md\n"
    )]
    Lint {
        /// Page file or directory of pages.
        #[arg(value_name = "PAGE")]
        page: PathBuf,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    // Parse output format
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let mode: DisplayMode = cli.mode.parse().map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Trace { script, out } => {
            crate::backend::script::run_trace(&script, out.as_deref())
        }

        Commands::Annotate { page, out } => {
            crate::overlay::api::run_annotate(&page, out.as_deref(), mode)
        }

        Commands::Elements { page } => {
            crate::overlay::api::run_elements(&page, mode, render_config)
        }

        Commands::Inspect { page, selector } => {
            crate::overlay::api::run_inspect(&page, &selector, mode, render_config)
        }

        Commands::Replay { page, events } => {
            crate::overlay::api::run_replay(&page, &events, mode, render_config)
        }

        Commands::Lint { page } => crate::overlay::lint::run_lint(&page, render_config),
    }
}
