//! Annotation anchoring
//!
//! Converts a selection into a portable selector triple and re-finds that
//! triple in a (possibly changed) document.
//!
//! # Overview
//!
//! Each annotated span is stored three ways:
//!
//! ```text
//! RangeSelector         /p[2]/b[1] : 3  ->  /p[3] : 12     precise, breaks on DOM edits
//! TextPositionSelector  140 .. 171                          cheap, drifts on text edits
//! TextQuoteSelector     "the cat" with 32 chars of context  robust, may recur
//! ```
//!
//! Resolution tries them in that order and accepts the first candidate whose
//! covered text equals the stored quote.
//!
//! # Usage
//!
//! ```ignore
//! use crate::anchoring::{anchor, describe, AnchoringConfig};
//!
//! let triple = describe(&doc, root, &selection, &AnchoringConfig::default())?;
//! let anchor = anchor(&doc, root, &triple)?;
//! assert_eq!(anchor.strategy, Strategy::Range);
//! ```

mod describe;
mod path;
mod quote;
mod resolver;
mod text_index;
mod types;

use thiserror::Error;

pub use describe::describe;
pub use path::{container_of, is_valid_path, parse_path, path_to, resolve_path, PathError, PathStep};
pub use quote::{find_quote, QuoteMatch};
pub use resolver::{anchor, Resolver};
pub use text_index::TextIndex;
pub use types::{
    Anchor, AnchoringConfig, RangeSelector, Selector, SelectorTriple, Strategy,
    TextPositionSelector, TextQuoteSelector, DEFAULT_CONTEXT_LENGTH,
};

/// Anchoring errors
#[derive(Debug, Error)]
pub enum AnchorError {
    /// The selection covers no text or lies outside the root
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// No locator found the stored quote
    #[error("Text not found")]
    AnchoringFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, DomRange, TextSpan};
    use proptest::prelude::*;

    // Both globs export a `Strategy`; the locator enum is the one meant here
    use super::Strategy;

    const HTML: &str = "<h1>Notes</h1><p>The <b>quick</b> brown <i>fox</i> jumps</p>\
                        <ul><li>over the</li><li>lazy dog, the quick fox</li></ul>";

    proptest! {
        #[test]
        fn prop_describe_anchor_round_trip(a in 0usize..64, b in 0usize..64) {
            let doc = Document::parse_fragment(HTML).unwrap();
            let root = doc.root();
            let index = TextIndex::build(&doc, root);
            let (start, end) = (a.min(b) % index.len(), a.max(b) % (index.len() + 1));
            prop_assume!(start < end);

            let range = DomRange::new(
                index.point_at(start, false).unwrap(),
                index.point_at(end, true).unwrap(),
            );
            let triple = describe(&doc, root, &range, &AnchoringConfig::default()).unwrap();
            let anchor = anchor(&doc, root, &triple).unwrap();

            prop_assert_eq!(anchor.span(), TextSpan::new(start, end));
            prop_assert_eq!(anchor.strategy, Strategy::Range);
            prop_assert_eq!(index.slice(anchor.start, anchor.end), Some(triple.quote.exact.as_str()));
        }

        #[test]
        fn prop_quote_survives_prepended_text(a in 0usize..64, b in 0usize..64, pad in "[a-z ]{1,12}") {
            let doc = Document::parse_fragment(HTML).unwrap();
            let index = TextIndex::build(&doc, doc.root());
            let (start, end) = (a.min(b) % index.len(), a.max(b) % (index.len() + 1));
            prop_assume!(start < end);

            let range = DomRange::new(
                index.point_at(start, false).unwrap(),
                index.point_at(end, true).unwrap(),
            );
            let triple = describe(&doc, doc.root(), &range, &AnchoringConfig::default()).unwrap();

            let edited = Document::parse_fragment(&format!("{}{}", pad, HTML)).unwrap();
            let anchor = anchor(&edited, edited.root(), &triple).unwrap();
            let edited_index = TextIndex::build(&edited, edited.root());
            prop_assert_eq!(
                edited_index.slice(anchor.start, anchor.end),
                Some(triple.quote.exact.as_str())
            );
        }
    }
}
