//! Lenient HTML fragment parser
//!
//! Submissions come from a rich text editor, so the input is HTML rather than
//! well-formed XML. The quick-xml event reader is run with end-name checking
//! off and the tree builder repairs the rest:
//! - void elements (`<br>`, `<img>`, ...) never take children
//! - a stray end tag is ignored
//! - an end tag closes every element opened after its match
//! - anything still open at EOF is closed
//! - a `<` that cannot open a tag (`a < b`) is kept as text

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Document, DomError, Element, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Name of the synthetic element wrapping a parsed fragment
const FRAGMENT_ROOT: &str = "div";

impl Document {
    /// Parse an HTML fragment into a document rooted at a synthetic `div`
    pub fn parse_fragment(html: &str) -> Result<Self, DomError> {
        let mut doc = Document::new(FRAGMENT_ROOT);
        let root = doc.root();
        let mut open = vec![root];

        let html = escape_bare_lt(html);
        let mut reader = Reader::from_str(&html);
        reader.check_end_names(false);

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| DomError::Parse {
                position,
                message: e.to_string(),
            })?;
            let parent = open.last().copied().unwrap_or(root);

            match event {
                Event::Start(start) => {
                    let element = element_from(&start, position)?;
                    let is_void = VOID_ELEMENTS.contains(&element.name.as_str());
                    let id = doc.create_element(element);
                    doc.append_child(parent, id);
                    if !is_void {
                        open.push(id);
                    }
                }
                Event::Empty(start) => {
                    let id = doc.create_element(element_from(&start, position)?);
                    doc.append_child(parent, id);
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                    let matching = open.iter().rposition(|&n| {
                        n != root && doc.element(n).map(|el| el.name == name).unwrap_or(false)
                    });
                    if let Some(depth) = matching {
                        open.truncate(depth);
                    }
                }
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text);
                    let decoded = html_escape::decode_html_entities(&raw);
                    if !decoded.is_empty() {
                        let id = doc.create_text(decoded.into_owned());
                        doc.append_child(parent, id);
                    }
                }
                Event::CData(data) => {
                    let raw = String::from_utf8_lossy(&data).into_owned();
                    if !raw.is_empty() {
                        let id = doc.create_text(raw);
                        doc.append_child(parent, id);
                    }
                }
                Event::Eof => break,
                // Comments, doctype, declarations and processing instructions carry no text
                _ => {}
            }
        }

        doc.merge_text_siblings_deep(root);
        Ok(doc)
    }

    /// Merge adjacent text nodes everywhere below `id`
    pub fn merge_text_siblings_deep(&mut self, id: NodeId) {
        self.merge_text_siblings(id);
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            if !self.is_text(child) {
                self.merge_text_siblings_deep(child);
            }
        }
    }
}

/// Escape every `<` not followed by a tag name, `/`, `!` or `?`
fn escape_bare_lt(html: &str) -> Cow<'_, str> {
    let opens_tag = |next: Option<char>| {
        matches!(next, Some(c) if c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };

    let mut chars = html.char_indices().peekable();
    let mut escaped: Option<String> = None;
    while let Some((i, c)) = chars.next() {
        let bare = c == '<' && !opens_tag(chars.peek().map(|&(_, n)| n));
        if bare && escaped.is_none() {
            escaped = Some(String::with_capacity(html.len() + 8) + &html[..i]);
        }
        if let Some(out) = escaped.as_mut() {
            if bare {
                out.push_str("&lt;");
            } else {
                out.push(c);
            }
        }
    }

    match escaped {
        Some(out) => Cow::Owned(out),
        None => Cow::Borrowed(html),
    }
}

fn element_from(start: &BytesStart<'_>, position: usize) -> Result<Element, DomError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut element = Element::new(name);

    for attr in start.html_attributes().with_checks(false) {
        let attr = attr.map_err(|e| DomError::Parse {
            position,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = html_escape::decode_html_entities(&raw).into_owned();
        element.attrs.push((key, value));
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse_fragment("<p>The <b>quick</b> brown fox</p>").unwrap();
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 1);

        let p = doc.children(root)[0];
        assert_eq!(doc.element(p).unwrap().name, "p");
        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.text_content(root), "The quick brown fox");
    }

    #[test]
    fn test_parse_entities() {
        let doc = Document::parse_fragment("<p>Fish &amp; chips&nbsp;today</p>").unwrap();
        assert_eq!(doc.text_content(doc.root()), "Fish & chips\u{a0}today");
    }

    #[test]
    fn test_parse_void_elements() {
        let doc = Document::parse_fragment("<p>one<br>two<img src=\"a.png\">three</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let names: Vec<String> = doc
            .children(p)
            .iter()
            .map(|&n| match doc.element(n) {
                Some(el) => el.name.clone(),
                None => "#text".to_string(),
            })
            .collect();
        assert_eq!(names, vec!["#text", "br", "#text", "img", "#text"]);
    }

    #[test]
    fn test_parse_attributes() {
        let doc = Document::parse_fragment(r#"<p class="intro" title="a &lt; b">x</p>"#).unwrap();
        let p = doc.children(doc.root())[0];
        let el = doc.element(p).unwrap();
        assert_eq!(el.attr("class"), Some("intro"));
        assert_eq!(el.attr("title"), Some("a < b"));
    }

    #[test]
    fn test_parse_repairs_structure() {
        // Stray </i>, unclosed <em>
        let doc = Document::parse_fragment("<p>a</i>b<em>c</p>d").unwrap();
        let root = doc.root();
        assert_eq!(doc.text_content(root), "abcd");

        let p = doc.children(root)[0];
        assert_eq!(doc.element(p).unwrap().name, "p");
        // </p> closed the dangling <em> as well, so "d" sits under the root
        let last = *doc.children(root).last().unwrap();
        assert_eq!(doc.text(last), Some("d"));
    }

    #[test]
    fn test_parse_drops_comments() {
        let doc = Document::parse_fragment("<p>a<!-- hidden -->b</p>").unwrap();
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "ab");
    }

    #[test]
    fn test_parse_bare_less_than() {
        let doc = Document::parse_fragment("<p>if a < b then</p>").unwrap();
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 1);
        assert_eq!(doc.text_content(root), "if a < b then");
        assert_eq!(doc.inner_html(root), "<p>if a &lt; b then</p>");

        let doc = Document::parse_fragment("x<3 and 1 <= 2<").unwrap();
        assert_eq!(doc.text_content(doc.root()), "x<3 and 1 <= 2<");
    }

    #[test]
    fn test_escape_bare_lt_borrows_clean_input() {
        assert!(matches!(escape_bare_lt("<p>a</p>"), Cow::Borrowed(_)));
        assert_eq!(escape_bare_lt("a < b"), "a &lt; b");
    }

    #[test]
    fn test_parse_plain_text() {
        let doc = Document::parse_fragment("The quick brown fox").unwrap();
        assert_eq!(doc.children(doc.root()).len(), 1);
        assert_eq!(doc.text_content(doc.root()), "The quick brown fox");
    }
}
