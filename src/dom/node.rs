//! Node arena
//!
//! Nodes are never removed, so a `NodeId` stays valid for the life of the
//! document. The parser hands ids out in document order.

use serde::Serialize;

/// Index of a node in its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// Element name and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercased tag name
    pub name: String,
    /// Attributes in source order; bare attributes like `hidden` have an empty value
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    /// Full declaration, e.g. `<!DOCTYPE html>`
    Doctype(String),
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Position in the parent's children
    pub sibling_index: usize,
    /// 1-based source line where the node starts (0 for the document node)
    pub line: u32,
    pub data: NodeData,
}

/// An HTML document held as a flat node arena
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                sibling_index: 0,
                line: 0,
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Append a child node at the end of `parent`'s children
    pub fn append(&mut self, parent: NodeId, data: NodeData, line: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        let sibling_index = self.nodes[parent.0].children.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            sibling_index,
            line,
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let parent = node.parent?;
        if node.sibling_index == 0 {
            return None;
        }
        Some(self.node(parent).children[node.sibling_index - 1])
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn comment_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    /// Every node below `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(move |id| self.is_element(*id))
    }

    /// `id` and its ancestors, innermost first
    pub fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Set an attribute, replacing an existing value in place. No-op on
    /// non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            match el.attrs.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            el.attrs.retain(|(n, _)| n != name);
        }
    }

    /// The page root element: `<html>` when present, otherwise the first
    /// top-level element
    pub fn root_element(&self) -> Option<NodeId> {
        let top: Vec<NodeId> = self
            .children(self.root())
            .iter()
            .copied()
            .filter(|id| self.is_element(*id))
            .collect();
        top.iter()
            .copied()
            .find(|id| self.element(*id).map(|el| el.name == "html").unwrap_or(false))
            .or_else(|| top.first().copied())
    }

    /// Readable path to an element, e.g. `html>body>main#content>p:2`.
    ///
    /// Each step is the tag name, `#id` when the element has one, otherwise
    /// `:n` (1-based among siblings with the same tag) when it is not the only one.
    pub fn path(&self, id: NodeId) -> String {
        let mut steps: Vec<String> = self
            .ancestors_inclusive(id)
            .into_iter()
            .filter_map(|node| self.element(node).map(|el| (node, el)))
            .map(|(node, el)| self.path_step(node, el))
            .collect();
        steps.reverse();
        steps.join(">")
    }

    fn path_step(&self, id: NodeId, el: &ElementData) -> String {
        if let Some(elem_id) = el.attr("id").filter(|v| !v.is_empty()) {
            return format!("{}#{}", el.name, elem_id);
        }
        let Some(parent) = self.parent(id) else {
            return el.name.clone();
        };

        let siblings: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|s| self.element(*s).map(|e| e.name == el.name).unwrap_or(false))
            .collect();
        if siblings.len() <= 1 {
            return el.name.clone();
        }
        let position = siblings.iter().position(|s| *s == id).unwrap_or(0) + 1;
        format!("{}:{}", el.name, position)
    }
}
