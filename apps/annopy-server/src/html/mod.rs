//! HTML processing for submissions
//!
//! - `highlighter`: marker insertion and removal in a live document
//! - `render`: batch re-highlighting and server-side rendering
//! - `sanitize`: lol_html based cleanup of uploaded HTML

mod highlighter;
mod render;
mod sanitize;

use thiserror::Error;

use crate::dom::DomError;

pub use highlighter::{
    is_marker, HighlightConfig, HighlightError, Highlighter, MarkerKey, DRAFT_CLASS, HOVER_CLASS,
    ID_ATTRIBUTE, MARKER_CLASS,
};
pub use render::{highlight_all, render_annotated, RenderReport, RenderResult};
pub use sanitize::sanitize_html;

/// Errors during server-side rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Highlight(#[from] HighlightError),
}
