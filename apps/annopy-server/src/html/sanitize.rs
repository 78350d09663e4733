//! Submission sanitizing using lol_html

use lol_html::{element, rewrite_str, RewriteStrSettings};

use super::highlighter::ID_ATTRIBUTE;
use super::RenderError;

fn is_script_url(value: &str) -> bool {
    value.trim().to_ascii_lowercase().starts_with("javascript:")
}

/// Drop `script`/`style` elements, `on*` attributes and `javascript:` URLs
///
/// The marker id attribute is stripped too, so stored content can never pass
/// for a highlight.
pub fn sanitize_html(html: &str) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let handlers: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| name.starts_with("on"))
                        .collect();
                    for name in handlers {
                        el.remove_attribute(&name);
                    }

                    el.remove_attribute(ID_ATTRIBUTE);

                    for attr in ["href", "src", "action"] {
                        if el.get_attribute(attr).is_some_and(|v| is_script_url(&v)) {
                            el.remove_attribute(attr);
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| RenderError::Rewrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_script_and_style() {
        let html = "<p>Hello</p><script>alert('xss')</script><style>p{}</style><p>World</p>";
        let result = sanitize_html(html).unwrap();
        assert_eq!(result, "<p>Hello</p><p>World</p>");
    }

    #[test]
    fn test_removes_event_handlers() {
        let html = r#"<p onclick="alert(1)" onmouseenter="x()" class="keep">Hello</p>"#;
        let result = sanitize_html(html).unwrap();
        assert!(!result.contains("onclick"));
        assert!(!result.contains("onmouseenter"));
        assert!(result.contains(r#"class="keep""#));
    }

    #[test]
    fn test_strips_javascript_urls() {
        let html = r#"<a href=" JavaScript:alert(1)">x</a><a href="https://example.com">y</a>"#;
        let result = sanitize_html(html).unwrap();
        assert!(!result.to_lowercase().contains("javascript"));
        assert!(result.contains("https://example.com"));
    }

    #[test]
    fn test_strips_marker_id() {
        let html = r#"<span class="annotated annotated-3" data-annotation-id="3">x</span>"#;
        let result = sanitize_html(html).unwrap();
        assert_eq!(result, r#"<span class="annotated annotated-3">x</span>"#);
    }
}
