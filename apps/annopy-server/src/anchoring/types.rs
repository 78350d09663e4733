//! Selector and anchor types
//!
//! Selectors follow the W3C Web Annotation selector vocabulary so a stored
//! triple can be handed to other annotation tooling unchanged.
//!
//! Reference: <https://www.w3.org/TR/annotation-model/#selectors>

use serde::{Deserialize, Serialize};

use crate::dom::TextSpan;

/// Default number of context characters kept on each side of a quote
pub const DEFAULT_CONTEXT_LENGTH: usize = 32;

/// Container paths plus character offsets inside those containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSelector {
    pub start_container: String,
    pub start_offset: usize,
    pub end_container: String,
    pub end_offset: usize,
}

/// Offsets into the root's flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPositionSelector {
    pub start: usize,
    pub end: usize,
}

/// The quoted text with its surrounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuoteSelector {
    pub exact: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// A single selector, tagged the way Web Annotation serializes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    #[serde(rename = "RangeSelector")]
    Range(RangeSelector),
    #[serde(rename = "TextPositionSelector")]
    TextPosition(TextPositionSelector),
    #[serde(rename = "TextQuoteSelector")]
    TextQuote(TextQuoteSelector),
}

/// The three descriptions of one span, always produced together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTriple {
    pub range: RangeSelector,
    pub position: TextPositionSelector,
    pub quote: TextQuoteSelector,
}

impl SelectorTriple {
    /// The triple as a selector list, in resolution order
    pub fn to_selectors(&self) -> Vec<Selector> {
        vec![
            Selector::Range(self.range.clone()),
            Selector::TextPosition(self.position),
            Selector::TextQuote(self.quote.clone()),
        ]
    }
}

/// Which locator produced an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Range,
    TextPosition,
    TextQuote,
}

impl Strategy {
    /// Resolution order
    pub const ALL: [Strategy; 3] = [Strategy::Range, Strategy::TextPosition, Strategy::TextQuote];

    /// Fallback tier, 1 being the most precise
    pub fn tier(self) -> u8 {
        match self {
            Strategy::Range => 1,
            Strategy::TextPosition => 2,
            Strategy::TextQuote => 3,
        }
    }
}

/// A live span resolved against the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Flattened-text character offsets relative to the root
    pub start: usize,
    pub end: usize,
    pub strategy: Strategy,
    pub tier: u8,
    /// The quote locator chose among equally scored occurrences
    pub ambiguous: bool,
}

impl Anchor {
    pub fn new(span: TextSpan, strategy: Strategy) -> Self {
        Self {
            start: span.start,
            end: span.end,
            strategy,
            tier: strategy.tier(),
            ambiguous: false,
        }
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.end)
    }
}

/// Tuning for selector generation
#[derive(Debug, Clone, Copy)]
pub struct AnchoringConfig {
    /// Characters of prefix/suffix context kept around a quote
    pub context_length: usize,
}

impl Default for AnchoringConfig {
    fn default() -> Self {
        Self {
            context_length: DEFAULT_CONTEXT_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_serialization() {
        let selector = Selector::TextPosition(TextPositionSelector { start: 4, end: 9 });
        let json = serde_json::to_value(&selector).unwrap();
        assert_eq!(json["type"], "TextPositionSelector");
        assert_eq!(json["start"], 4);

        let range = Selector::Range(RangeSelector {
            start_container: "/p[1]".into(),
            start_offset: 0,
            end_container: "/p[1]".into(),
            end_offset: 3,
        });
        let json = serde_json::to_value(&range).unwrap();
        assert_eq!(json["type"], "RangeSelector");
        assert_eq!(json["startContainer"], "/p[1]");
    }

    #[test]
    fn test_strategy_tiers() {
        let tiers: Vec<u8> = Strategy::ALL.iter().map(|s| s.tier()).collect();
        assert_eq!(tiers, vec![1, 2, 3]);
    }
}
