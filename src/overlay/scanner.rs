//! Comment scanner
//!
//! Trace comments are written immediately before the markup they describe, so
//! the comments belonging to an element are the comment nodes directly in front
//! of it, up to the previous element.

use crate::dom::{Document, NodeData, NodeId};

/// Comment nodes attached to `element`, in document order.
///
/// Walks previous siblings, skipping text and declarations, and stops at the
/// first element.
pub fn preceding_comments(doc: &Document, element: NodeId) -> Vec<NodeId> {
    let mut comments = Vec::new();
    let mut current = doc.previous_sibling(element);

    while let Some(node) = current {
        match doc.node(node).data {
            NodeData::Element(_) => break,
            NodeData::Comment(_) => comments.push(node),
            _ => {}
        }
        current = doc.previous_sibling(node);
    }

    comments.reverse();
    comments
}
