//! HTML serialization

use super::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

impl Document {
    /// Serialize the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize `id` including its own tag
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (key, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    return;
                }

                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_markup() {
        let html = r#"<p class="intro">The <b>quick</b> brown<br>fox</p>"#;
        let doc = Document::parse_fragment(html).unwrap();
        assert_eq!(doc.inner_html(doc.root()), html);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let doc = Document::parse_fragment(r#"<p title="say &quot;hi&quot;">a &lt; b &amp; c</p>"#)
            .unwrap();
        let html = doc.inner_html(doc.root());
        assert!(html.contains("a &lt; b &amp; c"));
        assert!(html.contains("title=\"say &quot;hi&quot;\""));
    }
}
