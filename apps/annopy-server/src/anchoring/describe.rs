//! Selector generation from a live selection

use crate::dom::{Document, DomPoint, DomRange, NodeId};

use super::path::{container_of, path_to};
use super::text_index::TextIndex;
use super::types::{
    AnchoringConfig, RangeSelector, SelectorTriple, TextPositionSelector, TextQuoteSelector,
};
use super::AnchorError;

/// Describe a selection three ways from a single walk of `root`
///
/// Fails with [`AnchorError::InvalidSelection`] when the range is collapsed,
/// reversed or leaves the root.
pub fn describe(
    doc: &Document,
    root: NodeId,
    range: &DomRange,
    config: &AnchoringConfig,
) -> Result<SelectorTriple, AnchorError> {
    let index = TextIndex::build(doc, root);

    let start = index
        .offset_of(range.start)
        .ok_or_else(|| AnchorError::InvalidSelection("start is outside the root".into()))?;
    let end = index
        .offset_of(range.end)
        .ok_or_else(|| AnchorError::InvalidSelection("end is outside the root".into()))?;

    if start >= end {
        return Err(AnchorError::InvalidSelection(
            "selection covers no text".into(),
        ));
    }

    let (start_container, start_offset) = container_offset(doc, root, &index, range.start, start)?;
    let (end_container, end_offset) = container_offset(doc, root, &index, range.end, end)?;

    let exact = index
        .slice(start, end)
        .ok_or_else(|| AnchorError::InvalidSelection("selection is out of bounds".into()))?;

    Ok(SelectorTriple {
        range: RangeSelector {
            start_container,
            start_offset,
            end_container,
            end_offset,
        },
        position: TextPositionSelector { start, end },
        quote: TextQuoteSelector {
            exact: exact.to_string(),
            prefix: index.before(start, config.context_length).to_string(),
            suffix: index.after(end, config.context_length).to_string(),
        },
    })
}

fn container_offset(
    doc: &Document,
    root: NodeId,
    index: &TextIndex,
    point: DomPoint,
    flat: usize,
) -> Result<(String, usize), AnchorError> {
    let outside = || AnchorError::InvalidSelection("boundary is outside the root".into());

    let container = container_of(doc, root, point.node).ok_or_else(outside)?;
    let span = index.element_span(container).ok_or_else(outside)?;
    let path = path_to(doc, root, container).map_err(|_| outside())?;
    Ok((path, flat - span.start))
}
