//! Container paths for the range locator
//!
//! Grammar:
//! ```text
//! path  = step*
//! step  = "/" tag ["[" index "]"]
//! tag   = [a-zA-Z0-9]+
//! index = 1-based position among same-tag siblings (default 1)
//! ```
//!
//! The root is the empty path. Highlight markers are transparent: their
//! children are treated as children of the marker's parent, so a document
//! yields the same paths whether or not it is currently highlighted.

use thiserror::Error;

use crate::dom::{Document, NodeId};
use crate::html::is_marker;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Expected '/' at position {0}")]
    ExpectedStep(usize),

    #[error("Expected tag name at position {0}")]
    ExpectedTag(usize),

    #[error("Expected index at position {0}")]
    ExpectedIndex(usize),

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("No element matches step {0}")]
    NoSuchElement(String),

    #[error("Node is not inside the root")]
    OutsideRoot,
}

/// One `/tag[index]` step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub index: usize,
}

impl std::fmt::Display for PathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}[{}]", self.tag, self.index)
    }
}

/// Whether a stored path only uses characters a path can contain
pub fn is_valid_path(path: &str) -> bool {
    path.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '-' | '/' | '[' | ']'))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn parse_step(&mut self) -> Result<PathStep, PathError> {
        if !self.skip_if('/') {
            return Err(PathError::ExpectedStep(self.pos));
        }

        let tag = self.take_while(|c| c.is_ascii_alphanumeric());
        if tag.is_empty() {
            return Err(PathError::ExpectedTag(self.pos));
        }

        let index = if self.skip_if('[') {
            let digits = self.take_while(|c| c.is_ascii_digit());
            let index: usize = digits
                .parse()
                .map_err(|_| PathError::ExpectedIndex(self.pos))?;
            if index == 0 {
                return Err(PathError::ExpectedIndex(self.pos));
            }
            if !self.skip_if(']') {
                return Err(PathError::UnexpectedChar(
                    self.peek().unwrap_or('\0'),
                    self.pos,
                ));
            }
            index
        } else {
            1
        };

        Ok(PathStep {
            tag: tag.to_ascii_lowercase(),
            index,
        })
    }
}

/// Parse a container path into steps
pub fn parse_path(path: &str) -> Result<Vec<PathStep>, PathError> {
    let mut parser = Parser::new(path);
    let mut steps = Vec::new();
    while !parser.at_end() {
        steps.push(parser.parse_step()?);
    }
    Ok(steps)
}

/// Nearest non-marker element enclosing `node`, bounded by `root`
pub fn container_of(doc: &Document, root: NodeId, node: NodeId) -> Option<NodeId> {
    let mut current = if doc.is_text(node) {
        doc.parent(node)?
    } else {
        node
    };
    loop {
        if current == root {
            return Some(root);
        }
        if !doc.element(current).map(is_marker).unwrap_or(false) {
            return doc.is_inclusive_ancestor(root, current).then_some(current);
        }
        current = doc.parent(current)?;
    }
}

/// Element children of `id`, looking through markers
fn path_children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &child in doc.children(id) {
        match doc.element(child) {
            Some(el) if is_marker(el) => out.extend(path_children(doc, child)),
            Some(_) => out.push(child),
            None => {}
        }
    }
    out
}

/// Build the path of `element` relative to `root`
pub fn path_to(doc: &Document, root: NodeId, element: NodeId) -> Result<String, PathError> {
    let mut steps = Vec::new();
    let mut current = element;

    while current != root {
        let parent = doc
            .parent(current)
            .and_then(|p| container_of(doc, root, p))
            .ok_or(PathError::OutsideRoot)?;
        let tag = doc
            .element(current)
            .map(|el| el.name.clone())
            .ok_or(PathError::OutsideRoot)?;

        let siblings = path_children(doc, parent);
        let index = siblings
            .iter()
            .take_while(|&&s| s != current)
            .filter(|&&s| doc.element(s).map(|el| el.name == tag).unwrap_or(false))
            .count()
            + 1;

        steps.push(PathStep { tag, index });
        current = parent;
    }

    Ok(steps.iter().rev().map(|s| s.to_string()).collect())
}

/// Find the element a path points at
pub fn resolve_path(doc: &Document, root: NodeId, path: &str) -> Result<NodeId, PathError> {
    let mut current = root;
    for step in parse_path(path)? {
        current = path_children(doc, current)
            .into_iter()
            .filter(|&c| doc.element(c).map(|el| el.name == step.tag).unwrap_or(false))
            .nth(step.index - 1)
            .ok_or_else(|| PathError::NoSuchElement(step.to_string()))?;
    }
    Ok(current)
}
