//! Per-element trace index
//!
//! Recovers trace records for each element from the comments in front of it,
//! keeps one `ElementTrace` per element and mirrors a deduplicated summary into
//! the element's summary attribute.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::core::util::hash_bytes;
use crate::dom::{Document, NodeId};
use crate::overlay::scanner::preceding_comments;
use crate::overlay::OverlayConfig;
use crate::trace::record::TraceRecord;

/// Distinct joined keys of an element's records, first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementSummary {
    pub keys: Vec<String>,
}

impl ElementSummary {
    pub fn from_records(records: &[TraceRecord]) -> Self {
        let mut seen = HashSet::new();
        let keys = records
            .iter()
            .map(TraceRecord::joined_keys)
            .filter(|key| seen.insert(key.clone()))
            .collect();
        Self { keys }
    }

    /// Attribute form: one key string per line
    pub fn text(&self) -> String {
        self.keys.join("\n")
    }
}

/// All trace records observed on one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTrace {
    pub element: NodeId,
    pub records: Vec<TraceRecord>,
}

impl ElementTrace {
    pub fn summary(&self) -> ElementSummary {
        ElementSummary::from_records(&self.records)
    }

    /// xxh3 digest of the serialized records
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(&self.records).unwrap_or_default();
        hash_bytes(&bytes)
    }
}

/// A comment that carried the trace marker but could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedComment {
    pub element: NodeId,
    pub comment: NodeId,
    pub line: u32,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct TraceIndex {
    config: OverlayConfig,
    traces: BTreeMap<NodeId, ElementTrace>,
    processed: HashSet<NodeId>,
    skipped: Vec<SkippedComment>,
}

impl TraceIndex {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Rescan one element and replace its trace.
    ///
    /// Returns the number of records found. With no records the element's
    /// trace and summary attribute are removed.
    pub fn rebuild(&mut self, doc: &mut Document, element: NodeId) -> usize {
        self.skipped.retain(|s| s.element != element);

        let mut records = Vec::new();
        for comment in preceding_comments(doc, element) {
            let Some(text) = doc.comment_text(comment) else {
                continue;
            };
            match TraceRecord::parse_comment(text) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    let line = doc.node(comment).line;
                    tracing::debug!(line, code = e.code(), error = %e, "skipping trace comment");
                    self.skipped.push(SkippedComment {
                        element,
                        comment,
                        line,
                        code: e.code(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.processed.insert(element);
        let count = records.len();

        if records.is_empty() {
            if self.traces.remove(&element).is_some() {
                tracing::debug!(element = %doc.path(element), "trace removed");
            }
            doc.remove_attr(element, &self.config.summary_attr);
            return 0;
        }

        let trace = ElementTrace { element, records };
        doc.set_attr(element, &self.config.summary_attr, &trace.summary().text());
        tracing::debug!(element = %doc.path(element), records = count, "trace rebuilt");
        self.traces.insert(element, trace);
        count
    }

    /// Process every not-yet-processed element in `context`'s subtree,
    /// `context` included when it is an element. Returns how many were processed.
    pub fn attach(&mut self, doc: &mut Document, context: NodeId) -> usize {
        let mut candidates = Vec::new();
        if doc.is_element(context) {
            candidates.push(context);
        }
        candidates.extend(
            doc.descendants(context)
                .into_iter()
                .filter(|id| doc.is_element(*id)),
        );

        let mut processed = 0;
        for element in candidates {
            if self.is_processed(element) {
                continue;
            }
            self.rebuild(doc, element);
            processed += 1;
        }
        processed
    }

    pub fn get(&self, element: NodeId) -> Option<&ElementTrace> {
        self.traces.get(&element)
    }

    pub fn is_traced(&self, element: NodeId) -> bool {
        self.traces.contains_key(&element)
    }

    pub fn is_processed(&self, element: NodeId) -> bool {
        self.processed.contains(&element)
    }

    /// Closest traced element at or above `node`
    pub fn nearest_traced(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.ancestors_inclusive(node)
            .into_iter()
            .find(|id| self.is_traced(*id))
    }

    /// Traces in document order
    pub fn iter(&self) -> impl Iterator<Item = &ElementTrace> {
        self.traces.values()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedComment] {
        &self.skipped
    }
}
