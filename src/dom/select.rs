//! Minimal element selectors
//!
//! Supports `tag`, `#id`, `.class`, `tag#id`, `tag.class`, `tag#id.class` and
//! `@N` (N-th element in document order, 0-based).

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::dom::node::{Document, NodeId};

static SIMPLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)?(?:#([\w-]+))?(?:\.([\w-]+))?$")
        .expect("Invalid SIMPLE_RE regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Invalid element index in selector '{0}'")]
    BadIndex(String),

    #[error("Unsupported selector '{0}' (use tag, #id, .class, tag#id, tag.class or @N)")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `@N`
    Index(usize),
    Simple {
        tag: Option<String>,
        id: Option<String>,
        class: Option<String>,
    },
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SelectorError::Empty);
        }

        if let Some(index) = s.strip_prefix('@') {
            return index
                .parse()
                .map(Selector::Index)
                .map_err(|_| SelectorError::BadIndex(s.to_string()));
        }

        let caps = SIMPLE_RE
            .captures(s)
            .ok_or_else(|| SelectorError::Unsupported(s.to_string()))?;
        Ok(Selector::Simple {
            tag: caps.get(1).map(|m| m.as_str().to_ascii_lowercase()),
            id: caps.get(2).map(|m| m.as_str().to_string()),
            class: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

impl Selector {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        match self {
            Selector::Index(_) => false,
            Selector::Simple {
                tag,
                id: elem_id,
                class,
            } => {
                tag.as_ref().map(|t| *t == el.name).unwrap_or(true)
                    && elem_id
                        .as_ref()
                        .map(|i| doc.attr(id, "id") == Some(i.as_str()))
                        .unwrap_or(true)
                    && class.as_ref().map(|c| el.has_class(c)).unwrap_or(true)
            }
        }
    }
}

/// First element in document order matching the selector
pub fn select_first(doc: &Document, selector: &Selector) -> Option<NodeId> {
    match selector {
        Selector::Index(n) => doc.elements().nth(*n),
        _ => doc.elements().find(|id| selector.matches(doc, *id)),
    }
}
