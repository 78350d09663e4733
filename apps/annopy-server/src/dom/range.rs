//! Selection boundary points

use serde::{Deserialize, Serialize};

use super::NodeId;

/// A boundary inside a text node, `offset` counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selected span between two boundary points
///
/// This is what a user's text selection hands to the locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl DomRange {
    pub fn new(start: DomPoint, end: DomPoint) -> Self {
        Self { start, end }
    }

    /// Both boundaries sit on the same point
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Flattened character offsets of a span inside a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
