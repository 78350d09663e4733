//! Text-quote locator
//!
//! Finds every literal occurrence of the stored quote and ranks them by how
//! much of the stored prefix/suffix context still surrounds them. No fuzzy
//! matching: a quote that no longer occurs verbatim does not resolve.

use crate::dom::{char_len, TextSpan};

use super::text_index::TextIndex;
use super::types::TextQuoteSelector;

/// Best occurrence of a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteMatch {
    pub span: TextSpan,
    pub score: usize,
    /// Number of occurrences found
    pub occurrences: usize,
    /// Another occurrence scored as well as this one
    pub ambiguous: bool,
}

/// Character offsets of every occurrence of `needle`, overlapping included
pub fn occurrences(index: &TextIndex, needle: &str) -> Vec<usize> {
    let Some(first) = needle.chars().next() else {
        return Vec::new();
    };
    let haystack = index.text();
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let byte = from + rel;
        if let Some(offset) = index.char_at_byte(byte) {
            found.push(offset);
        }
        from = byte + first.len_utf8();
    }
    found
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Context score of an occurrence starting at `start`
pub fn score(index: &TextIndex, quote: &TextQuoteSelector, start: usize) -> usize {
    let end = start + char_len(&quote.exact);
    let before = index.before(start, char_len(&quote.prefix));
    let after = index.after(end, char_len(&quote.suffix));
    common_suffix_len(&quote.prefix, before) + common_prefix_len(&quote.suffix, after)
}

/// Pick the occurrence of `quote.exact` whose context matches best
///
/// Ties go to the occurrence nearest `hint` (the stored text position),
/// then to the earliest one.
pub fn find_quote(
    index: &TextIndex,
    quote: &TextQuoteSelector,
    hint: Option<usize>,
) -> Option<QuoteMatch> {
    let len = char_len(&quote.exact);
    let candidates: Vec<(usize, usize)> = occurrences(index, &quote.exact)
        .into_iter()
        .map(|start| (start, score(index, quote, start)))
        .collect();

    let best_score = candidates.iter().map(|&(_, s)| s).max()?;
    let tied: Vec<usize> = candidates
        .iter()
        .filter(|&&(_, s)| s == best_score)
        .map(|&(start, _)| start)
        .collect();

    let start = tied
        .iter()
        .copied()
        .min_by_key(|&start| (hint.map(|h| start.abs_diff(h)).unwrap_or(0), start))?;

    Some(QuoteMatch {
        span: TextSpan::new(start, start + len),
        score: best_score,
        occurrences: candidates.len(),
        ambiguous: tied.len() > 1,
    })
}
