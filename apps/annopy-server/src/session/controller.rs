//! Annotation session for one document view
//!
//! Owns the page document, the fetched annotations and the single draft.
//! Every interaction goes through [`AnnotationSession`]. Starting a new draft
//! or edit always passes through `Idle` first, so at most one draft marker
//! exists.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::anchoring::{describe, Anchor, AnchorError, AnchoringConfig};
use crate::annotations::{
    Annotation, AnnotationBackend, AnnotationForm, BackendError, CategoryRegistry, Notice,
};
use crate::dom::{Document, DomRange, NodeId, TextSpan};
use crate::html::{highlight_all, HighlightError, Highlighter, MarkerKey, RenderReport};

use super::state::{DraftForm, SessionState};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The page has no element to annotate; nothing can proceed
    #[error("Document root #submission-{0} not found")]
    MissingRoot(u64),

    #[error("Annotation {0} is not loaded")]
    UnknownAnnotation(u64),

    #[error("Only the author may edit annotation {0}")]
    NotAuthor(u64),

    #[error("No annotation form is open")]
    NoDraft,

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Highlight(#[from] HighlightError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Identity inputs supplied by the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub submission: u64,
    pub user: u64,
    /// May this user add annotations
    pub can_add: bool,
    /// Annotation to focus once loaded
    pub focus: Option<u64>,
}

/// Result of toggling edit on an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Opened,
    Closed,
}

pub struct AnnotationSession<B: AnnotationBackend> {
    context: SessionContext,
    document: Document,
    root: NodeId,
    backend: B,
    categories: CategoryRegistry,
    highlighter: Highlighter,
    config: AnchoringConfig,
    annotations: Vec<Annotation>,
    anchors: HashMap<u64, Anchor>,
    state: SessionState,
    loading: bool,
    focused: Option<NodeId>,
    report: RenderReport,
}

impl<B: AnnotationBackend> AnnotationSession<B> {
    /// Bind a session to the `submission-<id>` element of `document`
    pub fn new(
        context: SessionContext,
        document: Document,
        backend: B,
        categories: CategoryRegistry,
        highlighter: Highlighter,
        config: AnchoringConfig,
    ) -> Result<Self, SessionError> {
        let root = document
            .element_by_id(&format!("submission-{}", context.submission))
            .ok_or(SessionError::MissingRoot(context.submission))?;

        Ok(Self {
            context,
            document,
            root,
            backend,
            categories,
            highlighter,
            config,
            annotations: Vec::new(),
            anchors: HashMap::new(),
            state: SessionState::Idle,
            loading: true,
            focused: None,
            report: RenderReport::default(),
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marker focused after the last load
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Outcome of the last reconciliation
    pub fn report(&self) -> &RenderReport {
        &self.report
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Fetch the annotation list once and draw it
    ///
    /// A failed fetch leaves the document unannotated. The loading flag is
    /// cleared whatever happens.
    pub async fn load(&mut self) -> &RenderReport {
        self.loading = true;
        let fetched = self
            .backend
            .fetch_annotations(self.context.submission, None)
            .await;
        self.loading = false;

        match fetched {
            Ok(annotations) => {
                info!(
                    submission = self.context.submission,
                    count = annotations.len(),
                    "Fetched annotations"
                );
                self.annotations = annotations;
                if let Err(e) = self.reconcile() {
                    warn!(error = %e, "Failed to draw annotations");
                }
                if let Some(id) = self.context.focus {
                    self.focused =
                        self.highlighter
                            .focus(&mut self.document, self.root, MarkerKey::Saved(id));
                }
            }
            Err(e) => warn!(error = %e, "Failed to fetch annotations"),
        }

        &self.report
    }

    /// Re-anchor and redraw every loaded annotation in one batch
    ///
    /// The annotation open for editing is skipped; the draft marker stands
    /// in for it.
    pub fn reconcile(&mut self) -> Result<&RenderReport, SessionError> {
        let editing = self.state.editing_id();
        let visible: Vec<Annotation> = self
            .annotations
            .iter()
            .filter(|a| Some(a.id) != editing)
            .cloned()
            .collect();

        let report = highlight_all(
            &mut self.document,
            self.root,
            &visible,
            &self.categories,
            &self.highlighter,
        )?;

        self.anchors.retain(|id, _| Some(*id) == editing);
        self.anchors.extend(report.anchored.iter().copied());
        self.report = report;
        Ok(&self.report)
    }

    /// Drop any draft and return to `Idle`, redrawing an edited annotation
    fn reset(&mut self) -> Result<(), SessionError> {
        self.highlighter
            .remove(&mut self.document, self.root, MarkerKey::Draft)?;

        if let Some(id) = self.state.editing_id() {
            if let (Some(anchor), Some(annotation)) =
                (self.anchors.get(&id), self.annotations.iter().find(|a| a.id == id))
            {
                let color = self.categories.label(annotation.type_id).color;
                self.highlighter.apply(
                    &mut self.document,
                    self.root,
                    anchor.span(),
                    MarkerKey::Saved(id),
                    Some(color.as_str()),
                )?;
            }
        }

        self.state = SessionState::Idle;
        Ok(())
    }

    /// Start a draft from a text selection
    ///
    /// Returns `false` when the selection is ignored: the user may not add
    /// annotations or the selection covers no text.
    pub fn select(&mut self, range: &DomRange) -> Result<bool, SessionError> {
        if !self.context.can_add {
            debug!("Selection ignored, user may not add annotations");
            return Ok(false);
        }

        let triple = match describe(&self.document, self.root, range, &self.config) {
            Ok(triple) => triple,
            Err(AnchorError::InvalidSelection(reason)) => {
                debug!(%reason, "Selection ignored");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        self.reset()?;

        let span = TextSpan::new(triple.position.start, triple.position.end);
        self.highlighter
            .apply(&mut self.document, self.root, span, MarkerKey::Draft, None)?;

        self.state = SessionState::Drafting(DraftForm {
            annotation_id: 0,
            triple,
            type_id: self.categories.list().first().map(|t| t.id),
            text: String::new(),
        });
        Ok(true)
    }

    /// Open an annotation for editing, or close it if it is already open
    pub fn edit(&mut self, id: u64) -> Result<EditOutcome, SessionError> {
        if self.state.editing_id() == Some(id) {
            self.reset()?;
            return Ok(EditOutcome::Closed);
        }

        let annotation = self
            .annotations
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(SessionError::UnknownAnnotation(id))?;
        if !self.context.can_add || annotation.user_id != self.context.user {
            return Err(SessionError::NotAuthor(id));
        }

        self.reset()?;
        self.highlighter
            .remove(&mut self.document, self.root, MarkerKey::Saved(id))?;
        if let Some(anchor) = self.anchors.get(&id) {
            let color = self.categories.label(annotation.type_id).color;
            self.highlighter.apply(
                &mut self.document,
                self.root,
                anchor.span(),
                MarkerKey::Draft,
                Some(color.as_str()),
            )?;
        }

        self.state = SessionState::Editing(DraftForm {
            annotation_id: id,
            triple: annotation.triple(),
            type_id: Some(annotation.type_id),
            text: annotation.text.clone(),
        });
        Ok(EditOutcome::Opened)
    }

    /// Close the open form without saving
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.reset()
    }

    /// Save the open form
    ///
    /// The session returns to `Idle` whatever the outcome; a refusal from the
    /// store is handed back as is. On success the list is fetched again.
    pub async fn submit(&mut self, type_id: u64, text: &str) -> Result<Notice, SessionError> {
        let form = match &self.state {
            SessionState::Idle => return Err(SessionError::NoDraft),
            SessionState::Drafting(draft) => Ok(AnnotationForm::create(
                self.context.submission,
                &draft.triple,
                type_id,
                text,
            )),
            SessionState::Editing(draft) => self
                .annotations
                .iter()
                .find(|a| a.id == draft.annotation_id)
                .map(|existing| AnnotationForm::update(existing, type_id, text))
                .ok_or(SessionError::UnknownAnnotation(draft.annotation_id)),
        };
        let form = match form {
            Ok(form) => form,
            Err(e) => {
                self.reset()?;
                return Err(e);
            }
        };

        let result = self.backend.submit(self.context.user, &form).await;
        self.reset()?;

        match result {
            Ok(notice) => {
                info!(message = %notice.message, "Annotation saved");
                self.context.focus = notice.annotation_id;
                self.load().await;
                Ok(notice)
            }
            Err(e) => {
                warn!(error = %e, "Annotation not saved");
                Err(e.into())
            }
        }
    }

    /// Delete one of the user's annotations
    pub async fn delete(&mut self, id: u64) -> Result<Notice, SessionError> {
        let result = self.backend.delete(self.context.user, id).await;
        self.reset()?;

        let notice = result?;
        self.highlighter
            .remove(&mut self.document, self.root, MarkerKey::Saved(id))?;
        self.annotations.retain(|a| a.id != id);
        self.anchors.remove(&id);
        info!(annotation = id, "Annotation deleted");
        Ok(notice)
    }

    /// Toggle emphasis on an annotation's markers
    pub fn hover(&mut self, id: u64, on: bool) -> usize {
        self.highlighter
            .set_emphasis(&mut self.document, self.root, MarkerKey::Saved(id), on)
    }

    /// Toggle emphasis on the draft marker
    pub fn hover_draft(&mut self, on: bool) -> usize {
        self.highlighter
            .set_emphasis(&mut self.document, self.root, MarkerKey::Draft, on)
    }
}
