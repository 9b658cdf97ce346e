//! HTML parsing
//!
//! Pages go through html5ever's tree builder, so implied end tags, foster
//! parenting and the implied `<head>`/`<body>` land exactly where a browser
//! puts them. The sink keeps comments, the doctype and the source line of
//! every node, then copies the finished tree into a `Document` in document
//! order.

use std::borrow::Cow;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_document, Attribute, ExpandedName, LocalName, Namespace, ParseOpts, QualName};

use crate::dom::node::{Document, ElementData, NodeData, NodeId};

/// Parse page markup into a document
pub fn parse_html(input: &str) -> Document {
    parse_document(ArenaSink::new(), ParseOpts::default()).one(input)
}

/// Node held by the sink while the tree builder is still moving things around
struct SinkNode {
    parent: Option<usize>,
    children: Vec<usize>,
    line: u32,
    name: QualName,
    data: NodeData,
    /// Content fragment of a `<template>`
    template: Option<usize>,
}

struct ArenaSink {
    nodes: Vec<SinkNode>,
    line: u64,
}

fn no_name() -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(""))
}

fn qualified(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn attr_pairs(attrs: Vec<Attribute>) -> Vec<(String, String)> {
    attrs
        .into_iter()
        .map(|a| (qualified(&a.name), a.value.to_string()))
        .collect()
}

fn doctype_text(name: &str, public_id: &str, system_id: &str) -> String {
    let mut out = format!("<!DOCTYPE {}", name);
    if !public_id.is_empty() {
        out.push_str(&format!(" PUBLIC \"{}\"", public_id));
        if !system_id.is_empty() {
            out.push_str(&format!(" \"{}\"", system_id));
        }
    } else if !system_id.is_empty() {
        out.push_str(&format!(" SYSTEM \"{}\"", system_id));
    }
    out.push('>');
    out
}

impl ArenaSink {
    fn new() -> Self {
        let mut sink = Self {
            nodes: Vec::new(),
            line: 1,
        };
        sink.create(NodeData::Document, no_name());
        sink
    }

    fn create(&mut self, data: NodeData, name: QualName) -> usize {
        self.nodes.push(SinkNode {
            parent: None,
            children: Vec::new(),
            line: u32::try_from(self.line).unwrap_or(u32::MAX),
            name,
            data,
            template: None,
        });
        self.nodes.len() - 1
    }

    fn detach(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|c| *c != node);
        }
    }

    /// Insert `node` under `parent`, before `before` when given, else last
    fn insert(&mut self, parent: usize, before: Option<usize>, node: usize) {
        self.detach(node);
        let children = &mut self.nodes[parent].children;
        let at = before
            .and_then(|b| children.iter().position(|c| *c == b))
            .unwrap_or(children.len());
        children.insert(at, node);
        self.nodes[node].parent = Some(parent);
    }

    /// Append text to `node` when it is a text node
    fn merge_text(&mut self, node: Option<usize>, text: &str) -> bool {
        match node.map(|n| &mut self.nodes[n].data) {
            Some(NodeData::Text(existing)) => {
                existing.push_str(text);
                true
            }
            _ => false,
        }
    }

    fn copy_children(&self, from: usize, doc: &mut Document, to: NodeId) {
        for &child in &self.nodes[from].children {
            let node = &self.nodes[child];
            let id = doc.append(to, node.data.clone(), node.line);
            self.copy_children(child, doc, id);
            if let Some(contents) = node.template {
                self.copy_children(contents, doc, id);
            }
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = usize;
    type Output = Document;

    fn finish(self) -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        self.copy_children(0, &mut doc, root);
        doc
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        tracing::trace!(line = self.line, %msg, "html parse error");
    }

    fn get_document(&mut self) -> usize {
        0
    }

    fn elem_name<'a>(&'a self, target: &'a usize) -> ExpandedName<'a> {
        self.nodes[*target].name.expanded()
    }

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> usize {
        let mut element = ElementData::new(qualified(&name));
        element.attrs = attr_pairs(attrs);
        let id = self.create(NodeData::Element(element), name);
        if flags.template {
            let contents = self.create(NodeData::Document, no_name());
            self.nodes[id].template = Some(contents);
        }
        id
    }

    fn create_comment(&mut self, text: StrTendril) -> usize {
        self.create(NodeData::Comment(text.to_string()), no_name())
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> usize {
        self.create(NodeData::Comment(format!("?{} {}", target, data)), no_name())
    }

    fn append(&mut self, parent: &usize, child: NodeOrText<usize>) {
        match child {
            NodeOrText::AppendNode(node) => self.insert(*parent, None, node),
            NodeOrText::AppendText(text) => {
                let last = self.nodes[*parent].children.last().copied();
                if !self.merge_text(last, &text) {
                    let node = self.create(NodeData::Text(text.to_string()), no_name());
                    self.insert(*parent, None, node);
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &usize,
        prev_element: &usize,
        child: NodeOrText<usize>,
    ) {
        if self.nodes[*element].parent.is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = doctype_text(&name, &public_id, &system_id);
        let node = self.create(NodeData::Doctype(doctype), no_name());
        self.insert(0, None, node);
    }

    fn get_template_contents(&mut self, target: &usize) -> usize {
        if let Some(contents) = self.nodes[*target].template {
            return contents;
        }
        let contents = self.create(NodeData::Document, no_name());
        self.nodes[*target].template = Some(contents);
        contents
    }

    fn same_node(&self, x: &usize, y: &usize) -> bool {
        x == y
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn append_before_sibling(&mut self, sibling: &usize, new_node: NodeOrText<usize>) {
        let Some(parent) = self.nodes[*sibling].parent else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                let children = &self.nodes[parent].children;
                let previous = children
                    .iter()
                    .position(|c| c == sibling)
                    .and_then(|i| i.checked_sub(1))
                    .map(|i| children[i]);
                if self.merge_text(previous, &text) {
                    return;
                }
                self.create(NodeData::Text(text.to_string()), no_name())
            }
        };
        self.insert(parent, Some(*sibling), node);
    }

    fn add_attrs_if_missing(&mut self, target: &usize, attrs: Vec<Attribute>) {
        if let NodeData::Element(el) = &mut self.nodes[*target].data {
            for (name, value) in attr_pairs(attrs) {
                if el.attr(&name).is_none() {
                    el.attrs.push((name, value));
                }
            }
        }
    }

    fn remove_from_parent(&mut self, target: &usize) {
        self.detach(*target);
    }

    fn reparent_children(&mut self, node: &usize, new_parent: &usize) {
        let children = std::mem::take(&mut self.nodes[*node].children);
        for child in &children {
            self.nodes[*child].parent = Some(*new_parent);
        }
        self.nodes[*new_parent].children.extend(children);
    }

    fn set_current_line(&mut self, line_number: u64) {
        self.line = line_number;
    }
}
