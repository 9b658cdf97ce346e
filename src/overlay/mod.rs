//! Trace overlay
//!
//! Recovers cache-operation records from trace comments in a page, indexes them
//! per element and drives the inspection panel from user events.

pub mod aggregate;
pub mod api;
pub mod controller;
pub mod lint;
pub mod panel;
pub mod scanner;
pub mod state;

/// Attribute holding an element's newline-separated key summary
pub const SUMMARY_ATTR: &str = "data-cache-trace";

/// Attribute on the page root mirroring the display mode
pub const MODE_ATTR: &str = "data-cache-trace-mode";

/// Attribute names the overlay writes into the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    pub summary_attr: String,
    pub mode_attr: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            summary_attr: SUMMARY_ATTR.to_string(),
            mode_attr: MODE_ATTR.to_string(),
        }
    }
}
