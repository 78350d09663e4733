//! Submission text statistics
//!
//! Counts are taken over the sanitized text a reader sees, with markup
//! removed and entities decoded. Block elements end a paragraph.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;

use crate::dom::{char_len, Document, NodeData, NodeId};
use crate::html::{sanitize_html, RenderError};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionStats {
    pub words: usize,
    pub chars: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    #[serde(rename = "uniquewords")]
    pub unique_words: usize,
    pub spaces: usize,
    #[serde(rename = "charswithoutspaces")]
    pub chars_without_spaces: usize,
    /// Seconds since creation; absent when the creation time lies ahead
    #[serde(rename = "timesincecreated")]
    pub age_seconds: Option<i64>,
}

impl SubmissionStats {
    /// Statistics of a submission's HTML created at `timecreated`
    pub fn compute(html: &str, timecreated: i64) -> Result<Self, RenderError> {
        let clean = sanitize_html(html)?;
        let doc = Document::parse_fragment(&clean)?;
        let root = doc.root();

        let flat = doc.text_content(root);
        let mut blocks = String::new();
        collect_blocks(&doc, root, &mut blocks);

        let chars = char_len(&flat);
        let spaces = flat.chars().filter(|&c| c == ' ').count();
        let words = words(&blocks);
        let unique_words = words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<HashSet<_>>()
            .len();

        let age = Utc::now().timestamp() - timecreated;
        Ok(Self {
            words: words.len(),
            chars,
            sentences: sentences(&blocks),
            paragraphs: blocks.lines().filter(|l| !l.trim().is_empty()).count(),
            unique_words,
            spaces,
            chars_without_spaces: chars - spaces,
            age_seconds: (age >= 0).then_some(age),
        })
    }
}

/// Text of `id` with a line break around every block element
fn collect_blocks(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Text(text) => out.push_str(text),
        NodeData::Element(el) => {
            let block = BLOCK_ELEMENTS.contains(&el.name.as_str());
            if block {
                out.push('\n');
            }
            for &child in doc.children(id) {
                collect_blocks(doc, child, out);
            }
            if block {
                out.push('\n');
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '-'
}

/// Runs of letters and digits, keeping inner apostrophes and hyphens
fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !is_word_char(c))
        .map(|w| w.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Pieces between runs of `.`, `!` and `?`; a run followed by a digit
/// (`3.5`) does not end a sentence
fn sentences(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    let mut piece_has_text = false;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut end = i;
            while end < chars.len() && matches!(chars[end], '.' | '!' | '?') {
                end += 1;
            }
            let decimal = chars.get(end).is_some_and(|c| c.is_ascii_digit());
            if !decimal {
                if piece_has_text {
                    count += 1;
                }
                piece_has_text = false;
            }
            i = end;
            continue;
        }
        if !chars[i].is_whitespace() {
            piece_has_text = true;
        }
        i += 1;
    }
    if piece_has_text {
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(html: &str) -> SubmissionStats {
        SubmissionStats::compute(html, Utc::now().timestamp() - 60).unwrap()
    }

    #[test]
    fn test_counts() {
        let s = stats("<p>The cat sat. The <b>cat</b> ran!</p><p>Is it 3.5 feet?</p>");
        assert_eq!(s.words, 11);
        assert_eq!(s.unique_words, 9);
        assert_eq!(s.sentences, 3);
        assert_eq!(s.paragraphs, 2);
        assert_eq!(s.chars, "The cat sat. The cat ran!Is it 3.5 feet?".chars().count());
        assert_eq!(s.spaces, 8);
        assert_eq!(s.chars_without_spaces, s.chars - 8);
        assert!(s.age_seconds.is_some_and(|age| age >= 60));
    }

    #[test]
    fn test_markup_is_not_counted() {
        let s = stats("<p>caf&eacute; <script>var x = 1;</script>au lait</p>");
        assert_eq!(s.words, 3);
        assert_eq!(s.chars, "café au lait".chars().count());
    }

    #[test]
    fn test_line_breaks_split_paragraphs() {
        let s = stats("one<br>two<br><br>three");
        assert_eq!(s.paragraphs, 3);
        // No terminator, so the whole text is one sentence
        assert_eq!(s.sentences, 1);
    }

    #[test]
    fn test_future_creation_has_no_age() {
        let s = SubmissionStats::compute("<p>x</p>", Utc::now().timestamp() + 3600).unwrap();
        assert_eq!(s.age_seconds, None);
    }

    #[test]
    fn test_word_edges() {
        assert_eq!(words("don't -- well-known 'quoted'"), vec!["don't", "well-known", "quoted"]);
        assert_eq!(sentences("Wait... what?! Yes"), 3);
        assert_eq!(sentences("   "), 0);
    }
}
