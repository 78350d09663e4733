//! Interactive annotation of one document view
//!
//! [`AnnotationSession`] ties the anchoring engine, the highlighter and an
//! [`AnnotationBackend`](crate::annotations::AnnotationBackend) together:
//! selections become drafts, drafts become saved annotations, and every
//! change to the list is redrawn in one batch.

mod controller;
mod state;

pub use controller::{AnnotationSession, EditOutcome, SessionContext, SessionError};
pub use state::{DraftForm, SessionState};
