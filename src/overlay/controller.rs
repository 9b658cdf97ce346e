//! Overlay controller
//!
//! Owns the trace index and the page-wide `OverlayState`. All user input goes
//! through `Overlay::dispatch`, which resolves hover targets to the nearest
//! traced element the way a single delegated listener on the document would.

use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::overlay::aggregate::TraceIndex;
use crate::overlay::panel::Panel;
use crate::overlay::state::{DisplayMode, OverlayState};
use crate::overlay::OverlayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

impl std::str::FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("Empty key name".to_string()),
            "Escape" | "Esc" => Ok(Key::Escape),
            _ => Ok(Key::Other),
        }
    }
}

/// User input delivered to the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    MouseEnter(NodeId),
    /// Control-bar click, carrying the clicked label
    Click(String),
    KeyUp(Key),
}

/// What a dispatched event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum Dispatch {
    /// Panel filled from the given element's records
    Shown { element: NodeId },
    /// Panel removed and key listener detached
    TornDown,
    ModeChanged { mode: DisplayMode },
    Ignored,
}

pub struct Overlay {
    config: OverlayConfig,
    index: TraceIndex,
    state: OverlayState,
}

impl Overlay {
    pub fn new(config: OverlayConfig, mode: DisplayMode) -> Self {
        Self {
            index: TraceIndex::new(config.clone()),
            config,
            state: OverlayState::new(mode),
        }
    }

    /// Index the whole document and mirror the display mode onto the page root
    pub fn initialize(&mut self, doc: &mut Document) {
        let root = doc.root();
        let processed = self.attach(doc, root);
        self.write_mode(doc);
        tracing::debug!(processed, traced = self.index.len(), "overlay initialized");
    }

    /// Index elements under `context` that have not been seen yet
    pub fn attach(&mut self, doc: &mut Document, context: NodeId) -> usize {
        self.index.attach(doc, context)
    }

    pub fn dispatch(&mut self, doc: &mut Document, event: OverlayEvent) -> Dispatch {
        match event {
            OverlayEvent::MouseEnter(target) => self.hover(doc, target),
            OverlayEvent::Click(label) => match DisplayMode::from_label(&label) {
                Some(mode) => {
                    tracing::debug!(mode = mode.label(), "display mode changed");
                    self.state.mode = mode;
                    self.write_mode(doc);
                    Dispatch::ModeChanged { mode }
                }
                None => {
                    tracing::debug!(label, "ignoring unknown mode label");
                    Dispatch::Ignored
                }
            },
            OverlayEvent::KeyUp(Key::Escape) if self.state.key_listener => self.teardown(),
            OverlayEvent::KeyUp(_) => Dispatch::Ignored,
        }
    }

    fn hover(&mut self, doc: &Document, target: NodeId) -> Dispatch {
        let Some(element) = self.index.nearest_traced(doc, target) else {
            return Dispatch::Ignored;
        };
        let Some(trace) = self.index.get(element) else {
            return Dispatch::Ignored;
        };

        self.state
            .panel
            .get_or_insert_with(Panel::new)
            .replace(&trace.records);
        self.state.inspected = Some(element);
        self.state.key_listener = true;
        Dispatch::Shown { element }
    }

    fn teardown(&mut self) -> Dispatch {
        if self.state.panel.take().is_none() {
            return Dispatch::Ignored;
        }
        self.state.inspected = None;
        self.state.key_listener = false;
        Dispatch::TornDown
    }

    fn write_mode(&self, doc: &mut Document) {
        if let Some(root) = doc.root_element() {
            doc.set_attr(root, &self.config.mode_attr, self.state.mode.as_str());
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn index(&self) -> &TraceIndex {
        &self.index
    }
}
