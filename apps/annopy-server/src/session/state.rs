//! Interaction states of one document view

use serde::Serialize;

use crate::anchoring::SelectorTriple;

/// The annotation form while a draft is open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftForm {
    /// 0 for a new annotation
    pub annotation_id: u64,
    pub triple: SelectorTriple,
    pub type_id: Option<u64>,
    pub text: String,
}

impl DraftForm {
    /// Quoted text for the form preview, HTML-escaped
    pub fn preview(&self) -> String {
        html_escape::encode_text(&self.triple.quote.exact).into_owned()
    }
}

/// At most one draft exists at a time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "form", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    /// A new selection awaiting submit or cancel
    Drafting(DraftForm),
    /// A saved annotation opened by its author
    Editing(DraftForm),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn form(&self) -> Option<&DraftForm> {
        match self {
            SessionState::Idle => None,
            SessionState::Drafting(form) | SessionState::Editing(form) => Some(form),
        }
    }

    /// Id of the annotation open for editing
    pub fn editing_id(&self) -> Option<u64> {
        match self {
            SessionState::Editing(form) => Some(form.annotation_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{RangeSelector, TextPositionSelector, TextQuoteSelector};

    fn form(id: u64, exact: &str) -> DraftForm {
        DraftForm {
            annotation_id: id,
            triple: SelectorTriple {
                range: RangeSelector {
                    start_container: String::new(),
                    start_offset: 0,
                    end_container: String::new(),
                    end_offset: exact.len(),
                },
                position: TextPositionSelector {
                    start: 0,
                    end: exact.len(),
                },
                quote: TextQuoteSelector {
                    exact: exact.into(),
                    prefix: String::new(),
                    suffix: String::new(),
                },
            },
            type_id: None,
            text: String::new(),
        }
    }

    #[test]
    fn test_editing_id() {
        assert_eq!(SessionState::Idle.editing_id(), None);
        assert_eq!(SessionState::Drafting(form(0, "x")).editing_id(), None);
        assert_eq!(SessionState::Editing(form(4, "x")).editing_id(), Some(4));
        assert!(SessionState::default().is_idle());
    }

    #[test]
    fn test_preview_is_escaped() {
        let draft = form(0, "<script>alert(1)</script>");
        assert_eq!(draft.preview(), "&lt;script&gt;alert(1)&lt;/script&gt;");
    }
}
