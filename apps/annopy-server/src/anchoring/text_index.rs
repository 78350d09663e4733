//! Flattened text index
//!
//! One pre-order walk over the root records where every text node and every
//! element begins in the root's flattened text. All three locators read from
//! the same index, so they always agree on where a boundary is.

use std::collections::HashMap;

use crate::dom::{char_len, Document, DomPoint, NodeData, NodeId, TextSpan};

#[derive(Debug, Clone, Copy)]
struct Chunk {
    node: NodeId,
    start: usize,
    len: usize,
}

/// Text of a root element with node-to-offset bookkeeping
#[derive(Debug, Clone)]
pub struct TextIndex {
    text: String,
    /// Byte index of each char, plus one trailing entry for the end
    char_bytes: Vec<usize>,
    chunks: Vec<Chunk>,
    chunk_of: HashMap<NodeId, usize>,
    /// Flattened span covered by each element below the root
    elements: HashMap<NodeId, TextSpan>,
}

impl TextIndex {
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut index = Self {
            text: String::new(),
            char_bytes: Vec::new(),
            chunks: Vec::new(),
            chunk_of: HashMap::new(),
            elements: HashMap::new(),
        };
        index.walk(doc, root);
        index.char_bytes.push(index.text.len());
        index
    }

    fn walk(&mut self, doc: &Document, id: NodeId) {
        match doc.data(id) {
            NodeData::Text(text) => {
                let start = self.char_bytes.len();
                let base = self.text.len();
                self.char_bytes
                    .extend(text.char_indices().map(|(byte, _)| base + byte));
                self.text.push_str(text);
                self.chunk_of.insert(id, self.chunks.len());
                self.chunks.push(Chunk {
                    node: id,
                    start,
                    len: char_len(text),
                });
            }
            NodeData::Element(_) => {
                let start = self.char_bytes.len();
                for &child in doc.children(id) {
                    self.walk(doc, child);
                }
                let end = self.char_bytes.len();
                self.elements.insert(id, TextSpan::new(start, end));
            }
        }
    }

    /// Flattened text of the root
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.char_bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text between two character offsets
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start > end || end > self.len() {
            return None;
        }
        Some(&self.text[self.char_bytes[start]..self.char_bytes[end]])
    }

    /// Up to `n` characters ending at `at`
    pub fn before(&self, at: usize, n: usize) -> &str {
        let at = at.min(self.len());
        self.slice(at.saturating_sub(n), at).unwrap_or("")
    }

    /// Up to `n` characters starting at `at`
    pub fn after(&self, at: usize, n: usize) -> &str {
        let at = at.min(self.len());
        self.slice(at, (at + n).min(self.len())).unwrap_or("")
    }

    /// Character offset of a byte index that falls on a char boundary
    pub fn char_at_byte(&self, byte: usize) -> Option<usize> {
        self.char_bytes.binary_search(&byte).ok()
    }

    /// Flattened offset of a boundary inside a text node of this root
    pub fn offset_of(&self, point: DomPoint) -> Option<usize> {
        let chunk = self.chunks[*self.chunk_of.get(&point.node)?];
        (point.offset <= chunk.len).then_some(chunk.start + point.offset)
    }

    /// Flattened span covered by an element inside this root
    pub fn element_span(&self, element: NodeId) -> Option<TextSpan> {
        self.elements.get(&element).copied()
    }

    /// Boundary point for a flattened offset
    ///
    /// An offset on the seam between two text nodes belongs to the later node
    /// when it starts a range and to the earlier node when it ends one, so the
    /// point always sits inside the text it bounds.
    pub fn point_at(&self, offset: usize, is_end: bool) -> Option<DomPoint> {
        let mut chunks = self.chunks.iter().filter(|c| c.len > 0);
        let found = if is_end {
            chunks.find(|c| c.start < offset && offset <= c.start + c.len)
        } else {
            chunks.find(|c| c.start <= offset && offset < c.start + c.len)
        };
        found.map(|c| DomPoint::new(c.node, offset - c.start))
    }

    /// Text nodes overlapping a span, with the covered char range of each
    pub fn segments(&self, span: TextSpan) -> Vec<(NodeId, usize, usize)> {
        self.chunks
            .iter()
            .filter(|c| c.len > 0 && c.start < span.end && span.start < c.start + c.len)
            .map(|c| {
                let from = span.start.saturating_sub(c.start);
                let to = (span.end - c.start).min(c.len);
                (c.node, from, to)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse_fragment("<p>The <b>quick</b> brown</p><p>fox é</p>").unwrap()
    }

    #[test]
    fn test_flattened_text() {
        let doc = sample();
        let index = TextIndex::build(&doc, doc.root());
        assert_eq!(index.text(), "The quick brownfox é");
        assert_eq!(index.len(), 20);
        assert_eq!(index.slice(4, 9), Some("quick"));
        assert_eq!(index.slice(19, 20), Some("é"));
        assert_eq!(index.slice(5, 21), None);
    }

    #[test]
    fn test_context_windows() {
        let doc = sample();
        let index = TextIndex::build(&doc, doc.root());
        assert_eq!(index.before(4, 32), "The ");
        assert_eq!(index.after(15, 3), "fox");
        assert_eq!(index.after(20, 3), "");
    }

    #[test]
    fn test_point_round_trip() {
        let doc = sample();
        let index = TextIndex::build(&doc, doc.root());

        // Offset 4 is the seam between "The " and "quick"
        let start = index.point_at(4, false).unwrap();
        assert_eq!(doc.text(start.node), Some("quick"));
        assert_eq!(start.offset, 0);

        let end = index.point_at(4, true).unwrap();
        assert_eq!(doc.text(end.node), Some("The "));
        assert_eq!(end.offset, 4);

        assert_eq!(index.offset_of(start), Some(4));
        assert_eq!(index.offset_of(end), Some(4));
    }

    #[test]
    fn test_element_spans() {
        let doc = sample();
        let index = TextIndex::build(&doc, doc.root());
        let first_p = doc.children(doc.root())[0];
        let second_p = doc.children(doc.root())[1];
        assert_eq!(index.element_span(first_p), Some(TextSpan::new(0, 15)));
        assert_eq!(index.element_span(second_p), Some(TextSpan::new(15, 20)));
        assert_eq!(index.element_span(doc.root()), Some(TextSpan::new(0, 20)));
    }

    #[test]
    fn test_segments() {
        let doc = sample();
        let index = TextIndex::build(&doc, doc.root());
        let segments = index.segments(TextSpan::new(2, 6));
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].1, segments[0].2), (2, 4));
        assert_eq!((segments[1].1, segments[1].2), (0, 2));
    }
}
