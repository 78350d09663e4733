//! Annotation module
//!
//! - `types`: annotation rows in the host's flattened layout, the inbound
//!   feed and the outbound create/update form
//! - `categories`: annotation types, color validation and priority ordering
//! - `store`: the persistence boundary and its in-memory implementation
//! - `remote`: the same boundary over HTTP
//! - `summary`: annotation counts per type and participant
//! - `templates`: the reusable type template library

mod categories;
mod remote;
mod store;
mod summary;
mod templates;
mod types;

pub use categories::{
    AnnotationType, CategoryError, CategoryLabel, CategoryRegistry, Direction, HexColor,
    TypeTemplate, DELETED_TYPE_COLOR, DELETED_TYPE_NAME,
};
pub use remote::{RemoteBackend, USER_HEADER};
pub use store::{
    AnnotationBackend, BackendError, MemoryStore, Notice, Submission, MSG_ADDED, MSG_DELETED,
    MSG_EDITED, MSG_INVALID, MSG_NOT_ALLOWED, MSG_SUBMISSION_UPDATED, MSG_TYPE_DELETED,
};
pub use summary::{summarize, AnnotationSummary, ParticipantCount, TypeCount};
pub use templates::{AnnotationTypeTemplate, TemplateChanges, TemplateLibrary};
pub use types::{Annotation, AnnotationFeed, AnnotationForm, UNSET};
