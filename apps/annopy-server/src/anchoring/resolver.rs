//! Anchor resolution
//!
//! Tries the range locator, then text position, then text quote. A candidate
//! is accepted only when the text it covers equals the stored quote exactly.
//! Resolution never mutates the document.

use tracing::{debug, warn};

use crate::dom::{Document, NodeId, TextSpan};

use super::path::resolve_path;
use super::quote::find_quote;
use super::text_index::TextIndex;
use super::types::{Anchor, RangeSelector, SelectorTriple, Strategy, TextPositionSelector};
use super::AnchorError;

/// Resolves any number of selector triples against one snapshot of a root
pub struct Resolver<'a> {
    doc: &'a Document,
    root: NodeId,
    index: TextIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(doc: &'a Document, root: NodeId) -> Self {
        Self {
            doc,
            root,
            index: TextIndex::build(doc, root),
        }
    }

    pub fn index(&self) -> &TextIndex {
        &self.index
    }

    /// Resolve a stored triple to a live anchor
    pub fn resolve(&self, triple: &SelectorTriple) -> Result<Anchor, AnchorError> {
        let exact = triple.quote.exact.as_str();
        if exact.is_empty() {
            debug!("Empty quote never anchors");
            return Err(AnchorError::AnchoringFailed);
        }

        for strategy in Strategy::ALL {
            let candidate = match strategy {
                Strategy::Range => self.by_range(&triple.range).map(|span| Anchor::new(span, strategy)),
                Strategy::TextPosition => self
                    .by_position(&triple.position)
                    .map(|span| Anchor::new(span, strategy)),
                Strategy::TextQuote => {
                    find_quote(&self.index, &triple.quote, Some(triple.position.start)).map(|m| {
                        if m.ambiguous {
                            warn!(
                                exact,
                                occurrences = m.occurrences,
                                start = m.span.start,
                                "Ambiguous quote, picked best-scoring occurrence"
                            );
                        }
                        Anchor {
                            ambiguous: m.ambiguous,
                            ..Anchor::new(m.span, strategy)
                        }
                    })
                }
            };

            let Some(anchor) = candidate else {
                debug!(?strategy, "Locator did not resolve");
                continue;
            };

            match self.index.slice(anchor.start, anchor.end) {
                Some(found) if found == exact => {
                    debug!(?strategy, start = anchor.start, end = anchor.end, "Anchored");
                    return Ok(anchor);
                }
                found => {
                    debug!(?strategy, ?found, "Locator text does not match quote, falling back");
                }
            }
        }

        Err(AnchorError::AnchoringFailed)
    }

    fn by_range(&self, selector: &RangeSelector) -> Option<TextSpan> {
        let start = self.container_point(&selector.start_container, selector.start_offset)?;
        let end = self.container_point(&selector.end_container, selector.end_offset)?;
        (start < end).then(|| TextSpan::new(start, end))
    }

    fn container_point(&self, path: &str, offset: usize) -> Option<usize> {
        let container = match resolve_path(self.doc, self.root, path) {
            Ok(container) => container,
            Err(e) => {
                debug!(path, error = %e, "Container path did not resolve");
                return None;
            }
        };
        let span = self.index.element_span(container)?;
        (offset <= span.len()).then_some(span.start + offset)
    }

    fn by_position(&self, selector: &TextPositionSelector) -> Option<TextSpan> {
        (selector.start < selector.end && selector.end <= self.index.len())
            .then(|| TextSpan::new(selector.start, selector.end))
    }
}

/// Resolve one triple against `root`
pub fn anchor(doc: &Document, root: NodeId, triple: &SelectorTriple) -> Result<Anchor, AnchorError> {
    Resolver::new(doc, root).resolve(triple)
}
