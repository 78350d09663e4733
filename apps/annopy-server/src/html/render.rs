//! Batch highlighting of stored annotations

use serde::Serialize;
use tracing::{debug, info};

use crate::anchoring::{Anchor, AnchorError, Resolver};
use crate::annotations::{Annotation, CategoryRegistry};
use crate::dom::{Document, NodeId};

use super::highlighter::{HighlightError, Highlighter, MarkerKey};
use super::sanitize::sanitize_html;
use super::RenderError;

/// Outcome of re-anchoring a set of annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Annotation ids with the anchor they were drawn at
    pub anchored: Vec<(u64, Anchor)>,
    /// Annotations whose text was not found
    pub not_found: Vec<u64>,
    /// Annotations whose quote matched more than one place equally well
    pub ambiguous: Vec<u64>,
}

/// Server-rendered submission
#[derive(Debug, Clone, Serialize)]
pub struct RenderResult {
    pub html: String,
    pub injected_count: usize,
    pub failed_annotations: Vec<u64>,
    pub ambiguous_annotations: Vec<u64>,
}

/// Re-anchor and re-highlight every annotation under `root` in one batch
///
/// Existing saved markers are removed first, so calling this again after the
/// annotation list changed leaves exactly one marker group per anchored
/// annotation. A draft marker is left alone.
pub fn highlight_all(
    doc: &mut Document,
    root: NodeId,
    annotations: &[Annotation],
    categories: &CategoryRegistry,
    highlighter: &Highlighter,
) -> Result<RenderReport, HighlightError> {
    highlighter.clear_saved(doc, root)?;

    let resolved: Vec<(&Annotation, Result<Anchor, AnchorError>)> = {
        let resolver = Resolver::new(doc, root);
        annotations
            .iter()
            .map(|a| (a, resolver.resolve(&a.triple())))
            .collect()
    };

    let mut report = RenderReport::default();
    for (annotation, result) in resolved {
        match result {
            Ok(anchor) => {
                let label = categories.label(annotation.type_id);
                highlighter.apply(
                    doc,
                    root,
                    anchor.span(),
                    MarkerKey::Saved(annotation.id),
                    Some(label.color.as_str()),
                )?;
                if anchor.ambiguous {
                    report.ambiguous.push(annotation.id);
                }
                report.anchored.push((annotation.id, anchor));
            }
            Err(e) => {
                debug!(annotation = annotation.id, error = %e, "Annotation not anchored");
                report.not_found.push(annotation.id);
            }
        }
    }

    info!(
        anchored = report.anchored.len(),
        not_found = report.not_found.len(),
        "Highlighted annotations"
    );
    Ok(report)
}

/// Sanitize a stored submission and draw its annotations into it
pub fn render_annotated(
    html: &str,
    annotations: &[Annotation],
    categories: &CategoryRegistry,
    highlighter: &Highlighter,
) -> Result<RenderResult, RenderError> {
    let sanitized = sanitize_html(html)?;
    let mut doc = Document::parse_fragment(&sanitized)?;
    let root = doc.root();

    let report = highlight_all(&mut doc, root, annotations, categories, highlighter)?;

    Ok(RenderResult {
        html: doc.inner_html(root),
        injected_count: report.anchored.len(),
        failed_annotations: report.not_found,
        ambiguous_annotations: report.ambiguous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{describe, AnchoringConfig, TextIndex};
    use crate::annotations::{AnnotationForm, HexColor, TypeTemplate};
    use crate::dom::{DomRange, TextSpan};

    const HTML: &str = "<p>The quick brown fox</p><p>jumps over the lazy dog</p>";

    fn registry() -> CategoryRegistry {
        CategoryRegistry::from_templates(&[TypeTemplate {
            name: "Grammar".into(),
            color: HexColor::parse("FF0000").unwrap(),
        }])
    }

    fn annotation(id: u64, type_id: u64, start: usize, end: usize) -> Annotation {
        let doc = Document::parse_fragment(HTML).unwrap();
        let index = TextIndex::build(&doc, doc.root());
        let range = DomRange::new(
            index.point_at(start, false).unwrap(),
            index.point_at(end, true).unwrap(),
        );
        let triple = describe(&doc, doc.root(), &range, &AnchoringConfig::default()).unwrap();
        AnnotationForm::create(1, &triple, type_id, "").into_annotation(id, 1)
    }

    #[test]
    fn test_render_marks_annotations() {
        let annotations = vec![annotation(1, 1, 4, 9), annotation(2, 1, 16, 24)];
        let result =
            render_annotated(HTML, &annotations, &registry(), &Highlighter::default()).unwrap();

        assert_eq!(result.injected_count, 2);
        assert!(result.failed_annotations.is_empty());
        assert!(result.html.contains("annotated-1"));
        assert!(result.html.contains("annotated-2"));
        assert!(result.html.contains("#FF0000"));
    }

    #[test]
    fn test_render_reports_missing_text() {
        let mut missing = annotation(3, 1, 4, 9);
        missing.exact = "zebra".into();
        let result =
            render_annotated(HTML, &[missing], &registry(), &Highlighter::default()).unwrap();
        assert_eq!(result.injected_count, 0);
        assert_eq!(result.failed_annotations, vec![3]);
    }

    #[test]
    fn test_scenario_e_deleted_type_falls_back() {
        let mut categories = registry();
        let annotations = vec![annotation(4, 1, 4, 9)];
        categories.remove(1).unwrap();

        let result =
            render_annotated(HTML, &annotations, &categories, &Highlighter::default()).unwrap();
        assert_eq!(result.injected_count, 1);
        assert!(result.html.contains("#FFFF00"));
    }

    #[test]
    fn test_highlight_all_is_repeatable() {
        let mut doc = Document::parse_fragment(HTML).unwrap();
        let root = doc.root();
        let annotations = vec![annotation(1, 1, 4, 9), annotation(2, 1, 6, 12)];
        let hl = Highlighter::default();

        highlight_all(&mut doc, root, &annotations, &registry(), &hl).unwrap();
        let first = doc.inner_html(root);
        let report = highlight_all(&mut doc, root, &annotations, &registry(), &hl).unwrap();

        assert_eq!(doc.inner_html(root), first);
        assert_eq!(report.anchored.len(), 2);
        assert_eq!(report.anchored[1].1.strategy, crate::anchoring::Strategy::Range);
    }

    #[test]
    fn test_highlight_all_reports_ambiguous_quote() {
        let mut doc = Document::parse_fragment("the cat sat near the cat").unwrap();
        let root = doc.root();
        let index = TextIndex::build(&doc, root);
        let range = DomRange::new(
            index.point_at(21, false).unwrap(),
            index.point_at(24, true).unwrap(),
        );
        let mut triple = describe(&doc, root, &range, &AnchoringConfig::default()).unwrap();
        triple.range.start_container = "/p[9]".into();
        triple.range.end_container = "/p[9]".into();
        triple.position.start = 0;
        triple.position.end = 3;
        triple.quote.prefix = "the ".into();
        triple.quote.suffix.clear();
        let annotations = vec![AnnotationForm::create(1, &triple, 1, "").into_annotation(8, 1)];

        let report =
            highlight_all(&mut doc, root, &annotations, &registry(), &Highlighter::default())
                .unwrap();

        assert_eq!(report.ambiguous, vec![8]);
        assert_eq!(report.anchored.len(), 1);
        assert!(report.anchored[0].1.ambiguous);
        assert_eq!(report.anchored[0].1.span(), TextSpan::new(4, 7));
        assert!(report.not_found.is_empty());
    }

    #[test]
    fn test_render_keeps_content_using_marker_class() {
        let html = r#"<p><span class="annotated" data-annotation-id="9">keep</span> me</p>"#;
        let result = render_annotated(html, &[], &registry(), &Highlighter::default()).unwrap();
        assert_eq!(result.html, r#"<p><span class="annotated">keep</span> me</p>"#);
    }

    #[test]
    fn test_render_sanitizes() {
        let html = "<p onclick=\"x()\">The quick</p><script>alert(1)</script>";
        let result = render_annotated(html, &[], &registry(), &Highlighter::default()).unwrap();
        assert_eq!(result.html, "<p>The quick</p>");
    }
}
