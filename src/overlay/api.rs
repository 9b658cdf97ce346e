//! Overlay commands: annotate, elements, inspect, replay

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::io::Write;
use std::path::Path;

use crate::core::file_reader::{read_lenient, read_required};
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::core::util::{collect_pages, display_path};
use crate::dom::{parse_html, select_first, to_html, Document, NodeId, Selector};
use crate::overlay::controller::{Dispatch, Key, Overlay, OverlayEvent};
use crate::overlay::state::DisplayMode;
use crate::overlay::OverlayConfig;

/// A parsed page with an initialized overlay
pub struct PageSession {
    /// Path label used in results
    pub label: String,
    pub doc: Document,
    pub overlay: Overlay,
}

impl PageSession {
    pub fn from_markup(label: impl Into<String>, markup: &str, mode: DisplayMode) -> Self {
        let mut doc = parse_html(markup);
        let mut overlay = Overlay::new(OverlayConfig::default(), mode);
        overlay.initialize(&mut doc);
        Self {
            label: label.into(),
            doc,
            overlay,
        }
    }

    pub fn open(path: &Path, mode: DisplayMode) -> Result<Self> {
        let markup = read_required(path)?;
        Ok(Self::from_markup(
            path.display().to_string(),
            &markup,
            mode,
        ))
    }

    pub fn select(&self, selector: &str) -> Result<NodeId> {
        let parsed: Selector = selector
            .parse()
            .with_context(|| format!("Invalid selector '{}'", selector))?;
        match select_first(&self.doc, &parsed) {
            Some(id) => Ok(id),
            None => bail!("No element matches selector '{}' in {}", selector, self.label),
        }
    }

    /// One element item per traced element, in document order
    pub fn elements(&self) -> ResultSet {
        self.overlay
            .index()
            .iter()
            .map(|trace| {
                let summary = trace.summary();
                ResultItem::element(&self.label, self.doc.path(trace.element))
                    .with_line(self.doc.node(trace.element).line)
                    .with_excerpt(summary.text())
                    .with_meta(Meta {
                        hash: Some(trace.digest()),
                        records: Some(trace.records.len()),
                    })
                    .with_data(json!({
                        "summary": summary.keys,
                        "records": trace.records,
                    }))
            })
            .collect()
    }

    /// Hover the element matching `selector` and report the panel
    pub fn inspect(&mut self, selector: &str, color: bool) -> Result<ResultItem> {
        let target = self.select(selector)?;
        let dispatch = self
            .overlay
            .dispatch(&mut self.doc, OverlayEvent::MouseEnter(target));
        if dispatch == Dispatch::Ignored {
            tracing::info!(selector, "no traced element at or above target");
        }
        Ok(self.panel_item(target, dispatch, color))
    }

    fn panel_item(&self, target: NodeId, dispatch: Dispatch, color: bool) -> ResultItem {
        let state = self.overlay.state();
        let element = state.inspected.unwrap_or(target);
        let mut item = ResultItem::panel(&self.label, self.doc.path(element))
            .with_line(self.doc.node(element).line);

        let rows = state
            .panel
            .as_ref()
            .map(|panel| panel.visible_rows(state.mode))
            .unwrap_or_default();
        item = item.with_data(json!({
            "dispatch": dispatch,
            "mode": state.mode,
            "status": state.status(),
            "rows": rows,
        }));

        if let Some(panel) = &state.panel {
            item = item
                .with_excerpt(panel.render_text(state.mode, color))
                .with_meta(Meta {
                    hash: None,
                    records: Some(panel.rows().len()),
                });
        }
        item
    }

    /// Dispatch a comma-separated event list, one snapshot per event.
    /// Every comma separates events, selectors included.
    pub fn replay(&mut self, events: &str, color: bool) -> Result<ResultSet> {
        let mut result_set = ResultSet::new();

        for (step, raw) in events
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .enumerate()
        {
            let event = self
                .parse_event(raw)
                .with_context(|| format!("Invalid replay event #{}: '{}'", step, raw))?;
            let dispatch = self.overlay.dispatch(&mut self.doc, event);
            tracing::debug!(step, event = raw, ?dispatch, "replayed event");
            result_set.push(self.snapshot(step, raw, dispatch, color));
        }

        Ok(result_set)
    }

    fn parse_event(&self, raw: &str) -> Result<OverlayEvent> {
        let Some((kind, arg)) = raw.split_once(':') else {
            bail!("Expected hover:<selector>, click:<LABEL> or key:<Key>");
        };
        match kind {
            "hover" => Ok(OverlayEvent::MouseEnter(self.select(arg)?)),
            "click" => Ok(OverlayEvent::Click(arg.to_string())),
            "key" => {
                let key: Key = arg.parse().map_err(anyhow::Error::msg)?;
                Ok(OverlayEvent::KeyUp(key))
            }
            other => bail!("Unknown event kind '{}'", other),
        }
    }

    fn snapshot(&self, step: usize, raw: &str, dispatch: Dispatch, color: bool) -> ResultItem {
        let state = self.overlay.state();
        let mut item = ResultItem::snapshot(&self.label);
        if let Some(inspected) = state.inspected {
            item.element = Some(self.doc.path(inspected));
        }

        let rows = state
            .panel
            .as_ref()
            .map(|panel| panel.visible_rows(state.mode));
        item = item.with_data(json!({
            "step": step,
            "event": raw,
            "dispatch": dispatch,
            "mode": state.mode,
            "status": state.status(),
            "key_listener": state.key_listener,
            "panel": rows,
        }));

        match &state.panel {
            Some(panel) => item
                .with_excerpt(panel.render_text(state.mode, color))
                .with_meta(Meta {
                    hash: None,
                    records: Some(panel.rows().len()),
                }),
            None => item,
        }
    }

    /// The page with summary and mode attributes written
    pub fn annotated(&self) -> String {
        to_html(&self.doc)
    }
}

fn print_results(result_set: &ResultSet, config: RenderConfig) -> Result<()> {
    let renderer = Renderer::with_config(config);
    let mut stdout = std::io::stdout().lock();
    renderer
        .render_to(result_set, &mut stdout)
        .context("Failed to write results")?;
    writeln!(stdout)?;
    Ok(())
}

/// Color the panel text only for terminal-oriented output
fn panel_color(config: RenderConfig) -> bool {
    config.format == OutputFormat::Markdown && colored::control::SHOULD_COLORIZE.should_colorize()
}

/// Run annotate command
pub fn run_annotate(page: &Path, out: Option<&Path>, mode: DisplayMode) -> Result<()> {
    let session = PageSession::open(page, mode)?;
    let html = session.annotated();
    if session.overlay.index().is_empty() {
        tracing::info!(page = %session.label, "no traced elements on page");
    }
    tracing::info!(traced = session.overlay.index().len(), "page annotated");

    match out {
        Some(path) => std::fs::write(path, &html)
            .with_context(|| format!("Failed to write annotated page: {:?}", path))?,
        None => println!("{}", html),
    }
    Ok(())
}

/// Run elements command over a page or a directory of pages
pub fn run_elements(path: &Path, mode: DisplayMode, config: RenderConfig) -> Result<()> {
    let mut result_set = ResultSet::new();

    for page in collect_pages(path) {
        let label = display_path(&page, path);
        let read = read_lenient(&page)?;
        for warning in &read.warnings {
            let mut item = warning.to_result_item();
            item.path = Some(label.clone());
            result_set.push(item);
        }
        let Some(markup) = read.content else {
            tracing::warn!(path = %label, reason = ?read.skip_reason, "page skipped");
            continue;
        };
        result_set.extend(PageSession::from_markup(label, &markup, mode).elements());
    }

    tracing::info!(items = result_set.len(), "elements listed");
    print_results(&result_set, config)
}

/// Run inspect command
pub fn run_inspect(
    page: &Path,
    selector: &str,
    mode: DisplayMode,
    config: RenderConfig,
) -> Result<()> {
    let mut session = PageSession::open(page, mode)?;
    let item = session.inspect(selector, panel_color(config))?;

    let mut result_set = ResultSet::new();
    result_set.push(item);
    print_results(&result_set, config)
}

/// Run replay command
pub fn run_replay(page: &Path, events: &str, mode: DisplayMode, config: RenderConfig) -> Result<()> {
    let mut session = PageSession::open(page, mode)?;
    let result_set = session.replay(events, panel_color(config))?;
    print_results(&result_set, config)
}
