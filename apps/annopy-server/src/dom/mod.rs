//! Document tree for submission text
//!
//! A small, mutable DOM used as the live document that selections are made
//! in, anchors are resolved against and highlights are inserted into.
//!
//! - `node`: arena tree, element/text nodes, mutation primitives
//! - `parser`: lenient HTML fragment parsing via quick-xml
//! - `serialize`: HTML output
//! - `range`: selection boundary points

mod node;
mod parser;
mod range;
mod serialize;

pub use node::{byte_offset, char_len, Document, Element, NodeData, NodeId};
pub use range::{DomPoint, DomRange, TextSpan};

use thiserror::Error;

/// Errors raised by tree parsing and mutation
#[derive(Debug, Error)]
pub enum DomError {
    #[error("HTML parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Offset {offset} out of bounds for text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Node {0} is detached from the tree")]
    Detached(NodeId),
}
