//! Highlight markers inside a live document
//!
//! A resolved span is rendered by wrapping each text node it touches in a
//! marker element. Every marker of one annotation shares the class
//! `annotated-<id>` so the group can be found, emphasized and unwrapped
//! together. Markers of different annotations may nest freely.

use thiserror::Error;

use crate::anchoring::TextIndex;
use crate::dom::{char_len, Document, DomError, Element, NodeId, TextSpan};

/// Class carried by every saved-annotation marker
pub const MARKER_CLASS: &str = "annotated";
/// Class carried by the draft marker
pub const DRAFT_CLASS: &str = "annotated_temp";
/// Emphasis class toggled on hover
pub const HOVER_CLASS: &str = "hovered";
/// Attribute holding the annotation id; present on every marker
pub const ID_ATTRIBUTE: &str = "data-annotation-id";
/// `ID_ATTRIBUTE` value of the draft marker
const DRAFT_ID: &str = "draft";

const EMPHASIS_COLOR: &str = "lightblue";

/// Whether an element was inserted by the highlighter
///
/// Submission content may use the marker classes itself; only elements that
/// also carry `ID_ATTRIBUTE` count.
pub fn is_marker(el: &Element) -> bool {
    el.attr(ID_ATTRIBUTE).is_some() && (el.has_class(MARKER_CLASS) || el.has_class(DRAFT_CLASS))
}

/// Identity of a marker group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    /// A persisted annotation
    Saved(u64),
    /// The single unsaved annotation in progress
    Draft,
}

impl MarkerKey {
    /// Class shared by every marker of this group
    pub fn group_class(&self) -> String {
        match self {
            MarkerKey::Saved(id) => format!("{}-{}", MARKER_CLASS, id),
            MarkerKey::Draft => DRAFT_CLASS.to_string(),
        }
    }
}

/// Configuration for marker elements
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Tag name of marker elements
    pub marker_tag: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            marker_tag: "span".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Span {start}..{end} exceeds text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error(transparent)]
    Dom(#[from] DomError),
}

fn marker_style(color: &str, emphasized: bool) -> String {
    let background = if emphasized {
        EMPHASIS_COLOR.to_string()
    } else {
        format!("#{}", color)
    };
    format!(
        "background-color: {}; text-decoration-color: #{};",
        background, color
    )
}

/// Color recorded in a marker's style
fn marker_color(el: &Element) -> Option<String> {
    let style = el.attr("style")?;
    let (_, rest) = style.split_once("text-decoration-color: #")?;
    Some(rest.chars().take_while(|c| c.is_ascii_hexdigit()).collect())
}

/// Inserts, finds and removes marker groups
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }

    fn marker_element(&self, key: MarkerKey, color: Option<&str>) -> Element {
        let mut el = Element::new(self.config.marker_tag.as_str());
        match key {
            MarkerKey::Saved(id) => {
                el.add_class(MARKER_CLASS);
                el.add_class(&key.group_class());
                el.set_attr(ID_ATTRIBUTE, id.to_string());
            }
            MarkerKey::Draft => {
                el.add_class(DRAFT_CLASS);
                el.set_attr(ID_ATTRIBUTE, DRAFT_ID);
            }
        }
        if let Some(color) = color {
            el.set_attr("style", marker_style(color, false));
        }
        el
    }

    /// Wrap every non-blank text portion of `span` in a marker
    ///
    /// Returns the markers created, in document order. Text nodes holding
    /// only whitespace are left alone so table and list structure is kept.
    pub fn apply(
        &self,
        doc: &mut Document,
        root: NodeId,
        span: TextSpan,
        key: MarkerKey,
        color: Option<&str>,
    ) -> Result<Vec<NodeId>, HighlightError> {
        let index = TextIndex::build(doc, root);
        if span.start > span.end || span.end > index.len() {
            return Err(HighlightError::OutOfBounds {
                start: span.start,
                end: span.end,
                len: index.len(),
            });
        }

        let mut markers = Vec::new();
        for (node, from, to) in index.segments(span) {
            let text = doc.text(node).ok_or(DomError::NotText(node))?;
            let len = char_len(text);
            if text.chars().skip(from).take(to - from).all(char::is_whitespace) {
                continue;
            }

            if to < len {
                doc.split_text(node, to)?;
            }
            let target = if from > 0 {
                doc.split_text(node, from)?
            } else {
                node
            };

            let parent = doc.parent(target).ok_or(DomError::Detached(target))?;
            let marker = doc.create_element(self.marker_element(key, color));
            doc.insert_before(parent, marker, target)?;
            doc.append_child(marker, target);
            markers.push(marker);
        }

        Ok(markers)
    }

    /// Markers of a group in document order
    pub fn markers_for(&self, doc: &Document, root: NodeId, key: MarkerKey) -> Vec<NodeId> {
        let class = key.group_class();
        doc.descendants(root)
            .into_iter()
            .filter(|&n| {
                doc.element(n)
                    .map(|el| is_marker(el) && el.has_class(&class))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Unwrap every marker of a group, returning how many were removed
    pub fn remove(
        &self,
        doc: &mut Document,
        root: NodeId,
        key: MarkerKey,
    ) -> Result<usize, HighlightError> {
        let markers = self.markers_for(doc, root, key);
        for &marker in &markers {
            doc.unwrap(marker)?;
        }
        if !markers.is_empty() {
            doc.merge_text_siblings_deep(root);
        }
        Ok(markers.len())
    }

    /// Unwrap every saved-annotation marker, leaving the draft in place
    pub fn clear_saved(&self, doc: &mut Document, root: NodeId) -> Result<usize, HighlightError> {
        let markers: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|&n| {
                doc.element(n)
                    .map(|el| is_marker(el) && el.has_class(MARKER_CLASS))
                    .unwrap_or(false)
            })
            .collect();
        for &marker in &markers {
            doc.unwrap(marker)?;
        }
        if !markers.is_empty() {
            doc.merge_text_siblings_deep(root);
        }
        Ok(markers.len())
    }

    /// Toggle hover emphasis on a group; no structural change
    pub fn set_emphasis(&self, doc: &mut Document, root: NodeId, key: MarkerKey, on: bool) -> usize {
        let markers = self.markers_for(doc, root, key);
        for &marker in &markers {
            let Some(el) = doc.element_mut(marker) else {
                continue;
            };
            if on {
                el.add_class(HOVER_CLASS);
            } else {
                el.remove_class(HOVER_CLASS);
            }
            if let Some(color) = marker_color(el) {
                el.set_attr("style", marker_style(&color, on));
            }
        }
        markers.len()
    }

    /// Make the first marker of a group focusable and return it
    pub fn focus(&self, doc: &mut Document, root: NodeId, key: MarkerKey) -> Option<NodeId> {
        let first = self.markers_for(doc, root, key).into_iter().next()?;
        if let Some(el) = doc.element_mut(first) {
            el.set_attr("tabindex", "-1");
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(html: &str) -> (Document, NodeId, Highlighter) {
        let doc = Document::parse_fragment(html).unwrap();
        let root = doc.root();
        (doc, root, Highlighter::default())
    }

    #[test]
    fn test_apply_single_node() {
        let (mut doc, root, hl) = setup("<p>The quick brown fox</p>");
        let markers = hl
            .apply(&mut doc, root, TextSpan::new(4, 9), MarkerKey::Saved(7), Some("FFFF00"))
            .unwrap();

        assert_eq!(markers.len(), 1);
        assert_eq!(
            doc.inner_html(root),
            "<p>The <span class=\"annotated annotated-7\" data-annotation-id=\"7\" \
             style=\"background-color: #FFFF00; text-decoration-color: #FFFF00;\">quick</span> \
             brown fox</p>"
        );
    }

    #[test]
    fn test_apply_across_nodes() {
        let (mut doc, root, hl) = setup("<p>The <b>quick</b> brown</p><p>fox</p>");
        let markers = hl
            .apply(&mut doc, root, TextSpan::new(2, 17), MarkerKey::Saved(1), None)
            .unwrap();

        assert_eq!(markers.len(), 4);
        assert_eq!(doc.text_content(root), "The quick brownfox");
        let wrapped: String = markers.iter().map(|&m| doc.text_content(m)).collect();
        assert_eq!(wrapped, "e quick brownfo");
    }

    #[test]
    fn test_skips_whitespace_nodes() {
        let (mut doc, root, hl) = setup("<ul><li>one</li> <li>two</li></ul>");
        let markers = hl
            .apply(&mut doc, root, TextSpan::new(0, 7), MarkerKey::Saved(2), None)
            .unwrap();
        assert_eq!(markers.len(), 2);
        let ul = doc.children(root)[0];
        assert_eq!(doc.text(doc.children(ul)[1]), Some(" "));
    }

    #[test]
    fn test_apply_remove_apply_is_idempotent() {
        let (mut doc, root, hl) = setup("<p>The <b>quick</b> brown fox</p>");
        let before = doc.text_content(root);
        let pristine = doc.inner_html(root);

        hl.apply(&mut doc, root, TextSpan::new(2, 12), MarkerKey::Saved(3), Some("00FF00"))
            .unwrap();
        assert_eq!(hl.remove(&mut doc, root, MarkerKey::Saved(3)).unwrap(), 3);
        assert_eq!(doc.text_content(root), before);
        assert_eq!(doc.inner_html(root), pristine);

        hl.apply(&mut doc, root, TextSpan::new(2, 12), MarkerKey::Saved(3), Some("00FF00"))
            .unwrap();
        assert_eq!(doc.text_content(root), before);
        assert_eq!(hl.markers_for(&doc, root, MarkerKey::Saved(3)).len(), 3);
    }

    #[test]
    fn test_overlapping_draft_removed_independently() {
        let (mut doc, root, hl) = setup("<p>The quick brown fox</p>");
        hl.apply(&mut doc, root, TextSpan::new(4, 15), MarkerKey::Saved(1), Some("FF0000"))
            .unwrap();
        hl.apply(&mut doc, root, TextSpan::new(10, 19), MarkerKey::Draft, None)
            .unwrap();
        assert_eq!(hl.markers_for(&doc, root, MarkerKey::Draft).len(), 2);

        hl.remove(&mut doc, root, MarkerKey::Draft).unwrap();
        assert!(hl.markers_for(&doc, root, MarkerKey::Draft).is_empty());

        let saved = hl.markers_for(&doc, root, MarkerKey::Saved(1));
        let saved_text: String = saved.iter().map(|&m| doc.text_content(m)).collect();
        assert_eq!(saved_text, "quick brown");
        assert_eq!(doc.text_content(root), "The quick brown fox");
    }

    #[test]
    fn test_clear_saved_keeps_draft() {
        let (mut doc, root, hl) = setup("<p>The quick brown fox</p>");
        hl.apply(&mut doc, root, TextSpan::new(0, 3), MarkerKey::Saved(1), None)
            .unwrap();
        hl.apply(&mut doc, root, TextSpan::new(4, 9), MarkerKey::Saved(2), None)
            .unwrap();
        hl.apply(&mut doc, root, TextSpan::new(10, 15), MarkerKey::Draft, None)
            .unwrap();

        assert_eq!(hl.clear_saved(&mut doc, root).unwrap(), 2);
        assert_eq!(hl.markers_for(&doc, root, MarkerKey::Draft).len(), 1);
        assert_eq!(doc.text_content(root), "The quick brown fox");
    }

    #[test]
    fn test_content_with_marker_class_is_not_a_marker() {
        let (mut doc, root, hl) = setup(r#"<p><span class="annotated">keep</span> me</p>"#);
        let span = doc.children(doc.children(root)[0])[0];
        assert!(!is_marker(doc.element(span).unwrap()));

        assert_eq!(hl.clear_saved(&mut doc, root).unwrap(), 0);
        assert_eq!(
            doc.inner_html(root),
            r#"<p><span class="annotated">keep</span> me</p>"#
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let (mut doc, root, hl) = setup("<p>abc</p>");
        assert!(matches!(
            hl.apply(&mut doc, root, TextSpan::new(1, 9), MarkerKey::Draft, None),
            Err(HighlightError::OutOfBounds { len: 3, .. })
        ));
    }

    #[test]
    fn test_emphasis_and_focus() {
        let (mut doc, root, hl) = setup("<p>The quick brown fox</p>");
        hl.apply(&mut doc, root, TextSpan::new(4, 9), MarkerKey::Saved(5), Some("ABCDEF"))
            .unwrap();
        let structure = doc.text_content(root);

        assert_eq!(hl.set_emphasis(&mut doc, root, MarkerKey::Saved(5), true), 1);
        let marker = hl.markers_for(&doc, root, MarkerKey::Saved(5))[0];
        let el = doc.element(marker).unwrap();
        assert!(el.has_class(HOVER_CLASS));
        assert!(el.attr("style").unwrap().contains("lightblue"));

        hl.set_emphasis(&mut doc, root, MarkerKey::Saved(5), false);
        let el = doc.element(marker).unwrap();
        assert!(!el.has_class(HOVER_CLASS));
        assert!(el.attr("style").unwrap().starts_with("background-color: #ABCDEF"));
        assert_eq!(doc.text_content(root), structure);

        assert_eq!(hl.focus(&mut doc, root, MarkerKey::Saved(5)), Some(marker));
        assert_eq!(doc.element(marker).unwrap().attr("tabindex"), Some("-1"));
        assert_eq!(hl.focus(&mut doc, root, MarkerKey::Saved(6)), None);
    }
}
