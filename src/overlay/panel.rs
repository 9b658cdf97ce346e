//! Inspection panel
//!
//! Holds one row per trace record of the inspected element. Rows are stored
//! unfiltered; the display mode only decides what a renderer shows.

use colored::Colorize;
use serde::Serialize;

use crate::overlay::state::DisplayMode;
use crate::trace::record::TraceRecord;
use crate::trace::wire::Method;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRow {
    pub method: Method,

    /// Keys joined with `:`
    pub keys: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl From<&TraceRecord> for PanelRow {
    fn from(record: &TraceRecord) -> Self {
        Self {
            method: record.method,
            keys: record.joined_keys(),
            contexts: record.contexts.clone(),
            tags: record.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Panel {
    rows: Vec<PanelRow>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current rows and append one per record, in record order
    pub fn replace(&mut self, records: &[TraceRecord]) {
        self.rows.clear();
        self.rows.extend(records.iter().map(PanelRow::from));
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn visible_rows(&self, mode: DisplayMode) -> Vec<&PanelRow> {
        self.rows.iter().filter(|row| mode.shows(row.method)).collect()
    }

    /// Plain-text rendering of the visible rows
    pub fn render_text(&self, mode: DisplayMode, color: bool) -> String {
        let mut out = String::new();
        for row in self.visible_rows(mode) {
            let method = format!("{:<6}", row.method.as_str());
            if color {
                let method = match row.method {
                    Method::Get => method.green(),
                    Method::Set => method.yellow(),
                    Method::Delete => method.red(),
                };
                out.push_str(&format!("{} {}\n", method, row.keys.bold()));
            } else {
                out.push_str(&format!("{} {}\n", method, row.keys));
            }

            if !row.contexts.is_empty() {
                out.push_str(&format!("       contexts: {}\n", row.contexts.join(", ")));
            }
            if let Some(tags) = row.tags.as_ref().filter(|t| !t.is_empty()) {
                out.push_str(&format!("       tags: {}\n", tags.join(", ")));
            }
        }
        out
    }
}
