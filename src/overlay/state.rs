//! Page-wide overlay state

use serde::Serialize;

use crate::dom::NodeId;
use crate::overlay::panel::Panel;
use crate::trace::wire::Method;

/// Which operations the panel displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Both,
    Get,
    Set,
    Hidden,
}

impl DisplayMode {
    /// Map a control-bar label (`BOTH`, `GET`, `SET`, `hide`) to a mode
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "BOTH" => Some(DisplayMode::Both),
            "GET" => Some(DisplayMode::Get),
            "SET" => Some(DisplayMode::Set),
            "hide" => Some(DisplayMode::Hidden),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Both => "BOTH",
            DisplayMode::Get => "GET",
            DisplayMode::Set => "SET",
            DisplayMode::Hidden => "hide",
        }
    }

    /// Value written to the page-root mode attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Both => "both",
            DisplayMode::Get => "get",
            DisplayMode::Set => "set",
            DisplayMode::Hidden => "hidden",
        }
    }

    /// Whether rows for `method` are visible in this mode
    pub fn shows(&self, method: Method) -> bool {
        match self {
            DisplayMode::Both => true,
            DisplayMode::Get => method == Method::Get,
            DisplayMode::Set => method == Method::Set,
            DisplayMode::Hidden => false,
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" => Ok(DisplayMode::Both),
            "get" => Ok(DisplayMode::Get),
            "set" => Ok(DisplayMode::Set),
            "hidden" | "hide" => Ok(DisplayMode::Hidden),
            _ => Err(format!("Unknown display mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStatus {
    /// No panel, or a panel with nothing in it
    Hidden,
    Shown,
}

/// Everything the overlay tracks for one page session
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    pub mode: DisplayMode,

    /// Element whose records are in the panel
    pub inspected: Option<NodeId>,

    /// Created on first hover, dropped on Escape
    pub panel: Option<Panel>,

    /// Key-up listener attached while a panel exists
    pub key_listener: bool,
}

impl OverlayState {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn status(&self) -> OverlayStatus {
        match &self.panel {
            Some(panel) if !panel.is_empty() => OverlayStatus::Shown,
            _ => OverlayStatus::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(DisplayMode::from_label("BOTH"), Some(DisplayMode::Both));
        assert_eq!(DisplayMode::from_label("GET"), Some(DisplayMode::Get));
        assert_eq!(DisplayMode::from_label("SET"), Some(DisplayMode::Set));
        assert_eq!(DisplayMode::from_label("hide"), Some(DisplayMode::Hidden));
        assert_eq!(DisplayMode::from_label("get"), None);
        assert_eq!(DisplayMode::from_label("HIDE"), None);

        for mode in [
            DisplayMode::Both,
            DisplayMode::Get,
            DisplayMode::Set,
            DisplayMode::Hidden,
        ] {
            assert_eq!(DisplayMode::from_label(mode.label()), Some(mode));
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Hidden".parse::<DisplayMode>(), Ok(DisplayMode::Hidden));
        assert_eq!("get".parse::<DisplayMode>(), Ok(DisplayMode::Get));
        assert!("all".parse::<DisplayMode>().is_err());
        assert_eq!(DisplayMode::default().to_string(), "both");
    }

    #[test]
    fn test_shows() {
        assert!(DisplayMode::Both.shows(Method::Delete));
        assert!(DisplayMode::Get.shows(Method::Get));
        assert!(!DisplayMode::Get.shows(Method::Set));
        assert!(!DisplayMode::Set.shows(Method::Delete));
        assert!(!DisplayMode::Hidden.shows(Method::Get));
    }

    #[test]
    fn test_status_follows_panel() {
        let mut state = OverlayState::new(DisplayMode::Get);
        assert_eq!(state.status(), OverlayStatus::Hidden);
        state.panel = Some(Panel::new());
        assert_eq!(state.status(), OverlayStatus::Hidden);
    }
}
