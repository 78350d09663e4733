//! Arena-backed document tree
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`].
//! Detached nodes stay in the arena but are unreachable from the root, so
//! ids handed out earlier never dangle. The arena is never compacted: every
//! marker that is unwrapped or text node that is merged away keeps its slot.
//! A long-lived document that is re-highlighted many times grows by those
//! slots; re-parse the source to start from a compact arena.

use std::fmt;

use super::DomError;

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

/// An element with a lower-cased tag name and ordered attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.attr("class") else {
            return;
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", joined);
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable document tree with a single root element
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document whose root is an element named `root_name`
    pub fn new(root_name: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element(Element::new(root_name));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` into `parent` right before `reference`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.detach(child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NotAChild {
                parent,
                child: reference,
            })?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    /// Remove a node from its parent; its own subtree stays intact
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Whether `node` is `ancestor` or lies inside its subtree
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// All nodes below `id` in document order (pre-order, excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text nodes below `id` in document order
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Concatenated text of all text nodes below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Find the element carrying `id="<value>"`
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|&n| self.element(n).and_then(|el| el.attr("id")) == Some(value))
    }

    /// Split a text node at a character offset
    ///
    /// The original node keeps the text before `at`; the returned node holds
    /// the rest and is inserted right after it.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, DomError> {
        let text = self.text(id).ok_or(DomError::NotText(id))?;
        let len = char_len(text);
        let byte = byte_offset(text, at).ok_or(DomError::OffsetOutOfBounds { offset: at, len })?;
        let tail = text[byte..].to_string();
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;

        if let NodeData::Text(text) = &mut self.nodes[id.0].data {
            text.truncate(byte);
        }

        let new_node = self.create_text(tail);
        self.nodes[new_node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index + 1, new_node);
        Ok(new_node)
    }

    /// Replace an element with its children
    pub fn unwrap(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        let _removed: Vec<NodeId> = siblings.splice(index..=index, children).collect();
        self.nodes[id.0].parent = None;
        Ok(())
    }

    /// Merge adjacent text children of `parent` and drop empty ones
    pub fn merge_text_siblings(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let child_text = match &self.nodes[child.0].data {
                NodeData::Text(text) => Some(text.clone()),
                NodeData::Element(_) => None,
            };
            match child_text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(text) => {
                    let previous = merged.last().copied().filter(|&p| self.is_text(p));
                    match previous {
                        Some(prev) => {
                            if let NodeData::Text(existing) = &mut self.nodes[prev.0].data {
                                existing.push_str(&text);
                            }
                            self.nodes[child.0].parent = None;
                        }
                        None => merged.push(child),
                    }
                }
                None => merged.push(child),
            }
        }

        self.nodes[parent.0].children = merged;
    }

    fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }
}

/// Number of characters (Unicode scalar values) in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `chars`; `Some(s.len())` for the end
pub fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    match s.char_indices().nth(chars) {
        Some((byte, _)) => Some(byte),
        None if char_len(s) == chars => Some(s.len()),
        None => None,
    }
}
